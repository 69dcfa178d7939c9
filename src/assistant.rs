use async_trait::async_trait;
use chrono::NaiveDateTime;
use regex::Regex;
use tokio::sync::Mutex;
use tracing::info;

use crate::reply::{ReplyError, ReplyService};

pub const STUDIO_NAME: &str = "Wohlfühl Wellness & Cosmetics Studio";
pub const STUDIO_ADDRESS: &str = "Wohlfühlstraße 7, 12345 Berlin";
pub const OPENING_HOURS: &str = "Monday to Saturday, 9:00 to 19:00";
pub const TREATMENTS: [&str; 4] = ["Facial", "Massage", "Manicure", "Pedicure"];

const SLOT_FORMAT: &str = "%Y-%m-%d %H:%M";

struct FaqEntry {
    keywords: &'static [&'static str],
    answer: &'static str,
}

const BOOKING_KEYWORDS: &[&str] = &["book", "appointment", "reserve", "schedule"];

const FAQ: &[FaqEntry] = &[
    FaqEntry {
        keywords: &["opening hours", "hours", "when", "open"],
        answer: "We are open Monday to Saturday from 9:00 to 19:00. Sunday is our day of rest.",
    },
    FaqEntry {
        keywords: &["treatments", "services", "offer", "what do you"],
        answer: "We offer a range of treatments, including facials, massages, manicures and pedicures. If you would like to book a specific treatment, just say so.",
    },
    FaqEntry {
        keywords: &["address", "where", "location", "find", "directions"],
        answer: "Our address is Wohlfühlstraße 7, 12345 Berlin. You will find us right on the market square.",
    },
];

const START_BOOKING: &str =
    "If you would like to book an appointment, please start by entering your full name.";
const NOT_UNDERSTOOD: &str = "Sorry, I didn't catch that. I can help you book an appointment or answer questions about opening hours and treatments.";
const ASK_EMAIL: &str = "Thank you! Now please enter your e-mail address.";
const RETRY_NAME: &str = "Please enter your full name (first and last name).";
const RETRY_EMAIL: &str = "That does not look like a valid e-mail address. Please try again.";
const ASK_SLOT: &str = "Alright. When would you like your appointment? Please enter date and time as 'YYYY-MM-DD HH:MM' (e.g. 2024-10-27 15:30).";
const RETRY_TREATMENT: &str =
    "I don't know that treatment. Please choose from Facial, Massage, Manicure or Pedicure.";
const RETRY_SLOT: &str = "That date or time format is not valid. Please use 'YYYY-MM-DD HH:MM' (e.g. 2024-10-27 15:30).";
const BOOKING_SUBMITTED: &str =
    "Thank you! Your appointment request has been submitted. We will get back to you shortly.";
const BOOKING_CANCELLED: &str = "The appointment request has been cancelled. If you would like to correct your details, please start again with 'book appointment'.";
const RETRY_CONFIRM: &str = "Please answer with 'yes' or 'no'.";

/// A fully collected and confirmed appointment request.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingRequest {
    pub name: String,
    pub email: String,
    pub treatment: String,
    pub slot: NaiveDateTime,
}

/// Where the booking dialogue currently stands. `Idle` also serves FAQ
/// answers; every other step collects one field of the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Idle,
    AwaitingName,
    AwaitingEmail,
    AwaitingTreatment,
    AwaitingSlot,
    AwaitingConfirmation,
}

struct Dialog {
    step: Step,
    name: String,
    email: String,
    treatment: String,
    slot: Option<NaiveDateTime>,
    confirmed: Vec<BookingRequest>,
}

impl Dialog {
    fn new() -> Self {
        Self {
            step: Step::Idle,
            name: String::new(),
            email: String::new(),
            treatment: String::new(),
            slot: None,
            confirmed: Vec::new(),
        }
    }

    fn reset(&mut self) {
        self.step = Step::Idle;
        self.name.clear();
        self.email.clear();
        self.treatment.clear();
        self.slot = None;
    }
}

/// In-process reply engine: keyword FAQ answers plus a five-step
/// appointment-booking dialogue (name, e-mail, treatment, slot,
/// confirmation). Used when no backend URL is configured.
pub struct StudioAssistant {
    dialog: Mutex<Dialog>,
    email_re: Regex,
}

impl StudioAssistant {
    pub fn new() -> Self {
        Self {
            dialog: Mutex::new(Dialog::new()),
            // Regex is static and known-good
            email_re: Regex::new(r"^[^@]+@[^@]+\.[^@]+$").unwrap(),
        }
    }

    fn answer(&self, dialog: &mut Dialog, message: &str) -> String {
        match dialog.step {
            Step::Idle => {
                if BOOKING_KEYWORDS.iter().any(|k| message.contains(k)) {
                    dialog.step = Step::AwaitingName;
                    return START_BOOKING.to_string();
                }
                for faq in FAQ {
                    if faq.keywords.iter().any(|k| message.contains(k)) {
                        return faq.answer.to_string();
                    }
                }
                NOT_UNDERSTOOD.to_string()
            }
            Step::AwaitingName => {
                if message.split_whitespace().count() >= 2 {
                    dialog.name = title_case(message);
                    dialog.step = Step::AwaitingEmail;
                    ASK_EMAIL.to_string()
                } else {
                    RETRY_NAME.to_string()
                }
            }
            Step::AwaitingEmail => {
                if self.email_re.is_match(message) {
                    dialog.email = message.to_string();
                    dialog.step = Step::AwaitingTreatment;
                    format!(
                        "Perfect. Which treatment would you like? We offer: {}.",
                        TREATMENTS.join(", ")
                    )
                } else {
                    RETRY_EMAIL.to_string()
                }
            }
            Step::AwaitingTreatment => {
                let matched = TREATMENTS
                    .iter()
                    .find(|t| message.contains(&t.to_lowercase()));
                if let Some(treatment) = matched {
                    dialog.treatment = treatment.to_string();
                    dialog.step = Step::AwaitingSlot;
                    ASK_SLOT.to_string()
                } else {
                    RETRY_TREATMENT.to_string()
                }
            }
            Step::AwaitingSlot => match NaiveDateTime::parse_from_str(message, SLOT_FORMAT) {
                Ok(slot) => {
                    dialog.slot = Some(slot);
                    dialog.step = Step::AwaitingConfirmation;
                    format!(
                        "Please confirm your details:\nName: {}\nE-mail: {}\nTreatment: {}\nDate & time: {}\nIs that correct? (yes/no)",
                        dialog.name,
                        dialog.email,
                        dialog.treatment,
                        slot.format(SLOT_FORMAT)
                    )
                }
                Err(_) => RETRY_SLOT.to_string(),
            },
            Step::AwaitingConfirmation => match message {
                "yes" | "confirm" | "correct" => {
                    let request = BookingRequest {
                        name: dialog.name.clone(),
                        email: dialog.email.clone(),
                        treatment: dialog.treatment.clone(),
                        // Step is only reachable with a parsed slot
                        slot: dialog.slot.unwrap(),
                    };
                    info!(
                        name = %request.name,
                        treatment = %request.treatment,
                        slot = %request.slot,
                        "appointment request confirmed"
                    );
                    dialog.confirmed.push(request);
                    info!(total = dialog.confirmed.len(), "booking recorded");
                    dialog.reset();
                    BOOKING_SUBMITTED.to_string()
                }
                "no" | "cancel" | "wrong" => {
                    dialog.reset();
                    BOOKING_CANCELLED.to_string()
                }
                _ => RETRY_CONFIRM.to_string(),
            },
        }
    }

    #[cfg(test)]
    async fn confirmed_bookings(&self) -> Vec<BookingRequest> {
        self.dialog.lock().await.confirmed.clone()
    }
}

impl Default for StudioAssistant {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplyService for StudioAssistant {
    async fn reply(&self, message: &str) -> Result<String, ReplyError> {
        let normalized = message.trim().to_lowercase();
        let mut dialog = self.dialog.lock().await;
        Ok(self.answer(&mut dialog, &normalized))
    }
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
