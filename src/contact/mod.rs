pub mod callback;
pub mod whatsapp;

pub use callback::{ CallbackClient, CallbackError, CallbackOutcome, Notice };
pub use whatsapp::{ LinkOpener, WhatsAppLink };
