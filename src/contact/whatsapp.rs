use log::{ debug, info };
use url::Url;

pub const NEW_CONTEXT_TARGET: &str = "_blank";

/// Hands a URL to whatever environment hosts the widget. Fire-and-forget:
/// a blocked popup or missing handler is not reported back.
pub trait LinkOpener: Send + Sync {
    fn open(&self, url: &Url, target: &str);
}

/// `https://<domain>/<number>?text=<greeting>`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WhatsAppLink {
    domain: String,
    number: String,
    greeting: String,
}

impl WhatsAppLink {
    pub fn new(domain: &str, number: &str, greeting: &str) -> Self {
        Self {
            domain: domain.to_string(),
            number: number.to_string(),
            greeting: greeting.to_string(),
        }
    }

    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    pub fn url(&self) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!("https://{}/", self.domain))?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .clear()
            .push(&self.number);
        url.query_pairs_mut().append_pair("text", &self.greeting);
        Ok(url)
    }

    pub fn open_with(&self, opener: &dyn LinkOpener) -> Result<(), url::ParseError> {
        let url = self.url()?;
        info!("Opening WhatsApp deep link for {}", self.number);
        debug!("Deep link: {}", url);
        opener.open(&url, NEW_CONTEXT_TARGET);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(String, String)>>);

    impl LinkOpener for Recorder {
        fn open(&self, url: &Url, target: &str) {
            self.0.lock().unwrap().push((url.to_string(), target.to_string()));
        }
    }

    fn decoded_text(url: &Url) -> Option<String> {
        url.query_pairs()
            .find(|(k, _)| k == "text")
            .map(|(_, v)| v.into_owned())
    }

    #[test]
    fn builds_default_link() {
        let link = WhatsAppLink::new("wa.me", "1234567890", "Hi! I need help with CityGuardian.");
        let url = link.url().unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("wa.me"));
        assert_eq!(url.path(), "/1234567890");
        assert_eq!(decoded_text(&url).as_deref(), Some("Hi! I need help with CityGuardian."));
    }

    #[test]
    fn greeting_round_trips_for_any_number_format() {
        let greeting = "Hi! I need help & more = 100% 👋 / ?";
        for number in ["1234567890", "+1 (555) 123-4567", "44 20 7946 0958", "", "a/b?c#d"] {
            let url = WhatsAppLink::new("wa.me", number, greeting).url().unwrap();
            assert_eq!(decoded_text(&url).as_deref(), Some(greeting), "number: {number:?}");
            assert_eq!(url.query_pairs().count(), 1);
        }
    }

    #[test]
    fn open_hands_url_to_new_context() {
        let recorder = Recorder::default();
        let link = WhatsAppLink::new("wa.me", "1234567890", "hello there");
        link.open_with(&recorder).unwrap();

        let opened = recorder.0.lock().unwrap();
        assert_eq!(opened.len(), 1);
        assert!(opened[0].0.starts_with("https://wa.me/1234567890?text="));
        assert_eq!(opened[0].1, NEW_CONTEXT_TARGET);
    }

    #[test]
    fn invalid_domain_is_an_error() {
        assert!(WhatsAppLink::new("", "1", "hi").url().is_err());
    }
}
