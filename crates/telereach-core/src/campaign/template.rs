//! Message template rendering with variable and spintax expansion

use chrono::{Local, Timelike};
use rand::Rng;
use regex::Regex;
use telereach_common::config::EngineConfig;
use telereach_storage::models::Contact;

/// Renders message templates for outreach sends
///
/// Supported placeholders: `{name}`, `{first_name}`, `{phone}`, `{time}`,
/// plus spintax groups like `{option1|option2}` that resolve to one option
/// at random. Anything else in braces is left as written.
pub struct TemplateRenderer {
    fallback_name: String,
    greeting_morning: String,
    greeting_afternoon: String,
    greeting_evening: String,
    spintax: Regex,
}

impl TemplateRenderer {
    /// Create a renderer with the configured fallback name and greetings
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            fallback_name: config.fallback_name.clone(),
            greeting_morning: config.greeting_morning.clone(),
            greeting_afternoon: config.greeting_afternoon.clone(),
            greeting_evening: config.greeting_evening.clone(),
            // A braced group is spintax only when it contains a pipe;
            // plain `{placeholder}` tokens pass through untouched.
            spintax: Regex::new(r"\{([^{}]*\|[^{}]*)\}").unwrap(),
        }
    }

    /// Render a template for one contact
    ///
    /// Variable substitutions are deterministic for a given contact and
    /// hour; only the spintax choices vary between calls.
    pub fn render(&self, template: &str, contact: &Contact) -> String {
        let mut rng = rand::thread_rng();
        self.render_at(template, contact, Local::now().hour(), &mut rng)
    }

    fn render_at(
        &self,
        template: &str,
        contact: &Contact,
        hour: u32,
        rng: &mut impl Rng,
    ) -> String {
        let name = contact
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.fallback_name);
        let first_name = name.split_whitespace().next().unwrap_or(name);
        let greeting = match hour {
            0..=11 => &self.greeting_morning,
            12..=17 => &self.greeting_afternoon,
            _ => &self.greeting_evening,
        };

        let rendered = template
            .replace("{name}", name)
            .replace("{first_name}", first_name)
            .replace("{phone}", &contact.phone)
            .replace("{time}", greeting);

        self.spintax
            .replace_all(&rendered, |caps: &regex::Captures| {
                let options: Vec<&str> = caps[1].split('|').collect();
                options[rng.gen_range(0..options.len())].to_string()
            })
            .into_owned()
    }
}
