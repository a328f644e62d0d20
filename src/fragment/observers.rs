//! Built-in key generation observers.

use axum::http::HeaderName;

use crate::fragment::{KeyGenerationContext, KeyGenerationObserver};

/// Which request an observer reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestSide {
    Master,
    Sub,
}

// == Header Key Part ==
/// Varies fragments on a request header, e.g. `Accept-Language` or `Cookie`.
///
/// Contributes `name=value` when the header is present; absent headers add
/// nothing.
#[derive(Debug, Clone)]
pub struct HeaderKeyPart {
    label: String,
    header: HeaderName,
    side: RequestSide,
}

impl HeaderKeyPart {
    pub fn new(header: HeaderName, side: RequestSide) -> Self {
        Self {
            label: format!("header:{}", header.as_str()),
            header,
            side,
        }
    }

    pub fn master(header: HeaderName) -> Self {
        Self::new(header, RequestSide::Master)
    }

    pub fn sub(header: HeaderName) -> Self {
        Self::new(header, RequestSide::Sub)
    }
}

impl KeyGenerationObserver for HeaderKeyPart {
    fn name(&self) -> &str {
        &self.label
    }

    fn on_key_generation<'a>(
        &self,
        mut context: KeyGenerationContext<'a>,
    ) -> anyhow::Result<KeyGenerationContext<'a>> {
        let request = match self.side {
            RequestSide::Master => context.master_request(),
            RequestSide::Sub => context.sub_request(),
        };

        if let Some(value) = request.header(&self.header) {
            context.add_part(&format!("{}={}", self.header.as_str(), value));
        }
        Ok(context)
    }
}

// == Option Key Part ==
/// Adds the value of a named configuration option to the key, so routes can
/// opt into extra key material declaratively.
#[derive(Debug, Clone)]
pub struct OptionKeyPart {
    label: String,
    option: String,
}

impl OptionKeyPart {
    pub fn new(option: impl Into<String>) -> Self {
        let option = option.into();
        Self {
            label: format!("option:{option}"),
            option,
        }
    }
}

impl KeyGenerationObserver for OptionKeyPart {
    fn name(&self) -> &str {
        &self.label
    }

    fn on_key_generation<'a>(
        &self,
        mut context: KeyGenerationContext<'a>,
    ) -> anyhow::Result<KeyGenerationContext<'a>> {
        if let Some(value) = context.configuration().option(&self.option) {
            context.add_part(&format!("{}={}", self.option, value));
        }
        Ok(context)
    }
}
