//! SOAP transport for the three Sonos services the orchestrations use.
//!
//! A [`SoapAction`] is plain data (service, action name, ordered arguments)
//! and can be sent any number of times, which is what the retry loop needs.

use std::fmt::Write as _;

use reqwest::Client;
use thiserror::Error;

use super::services::SonosService;
use super::utils::{build_sonos_url, escape_xml, extract_xml_text};

/// UPnP error codes a player reports while it is still switching content.
const TRANSIENT_UPNP_CODES: [u16; 3] = [701, 714, 716];

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SoapError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status with no SOAP fault in the body.
    #[error("HTTP error {0}: {1}")]
    HttpStatus(u16, String),

    /// `faultstring`, followed by the UPnP `errorCode` when the player sent one.
    #[error("SOAP fault: {0}")]
    Fault(String),

    /// A field the caller needs was absent or malformed.
    #[error("failed to parse SOAP response: {0}")]
    Parse(String),
}

pub type SoapResult<T> = Result<T, SoapError>;

impl SoapError {
    /// UPnP error code carried by a fault, if any.
    #[must_use]
    pub fn upnp_code(&self) -> Option<u16> {
        match self {
            SoapError::Fault(text) => text.split_whitespace().last()?.parse().ok(),
            _ => None,
        }
    }

    /// Whether retrying the same request may succeed: a transition fault or
    /// an HTTP timeout.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            SoapError::Http(e) => e.is_timeout(),
            _ => self
                .upnp_code()
                .is_some_and(|code| TRANSIENT_UPNP_CODES.contains(&code)),
        }
    }

    pub(crate) fn missing(action: &str, field: &str) -> Self {
        SoapError::Parse(format!("{} response has no valid {}", action, field))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Actions
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapAction {
    service: SonosService,
    name: &'static str,
    args: Vec<(&'static str, String)>,
}

impl SoapAction {
    /// An AVTransport action on instance 0.
    #[must_use]
    pub fn transport(name: &'static str) -> Self {
        Self::bare(SonosService::AVTransport, name).arg("InstanceID", "0")
    }

    /// A RenderingControl action on the Master channel of instance 0.
    #[must_use]
    pub fn rendering(name: &'static str) -> Self {
        Self::bare(SonosService::RenderingControl, name)
            .arg("InstanceID", "0")
            .arg("Channel", "Master")
    }

    /// A ZoneGroupTopology action; these take no instance.
    #[must_use]
    pub fn topology(name: &'static str) -> Self {
        Self::bare(SonosService::ZoneGroupTopology, name)
    }

    fn bare(service: SonosService, name: &'static str) -> Self {
        Self {
            service,
            name,
            args: Vec::new(),
        }
    }

    /// Appends an argument. Values are raw text; escaping happens once, in
    /// [`envelope`](Self::envelope).
    #[must_use]
    pub fn arg(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.args.push((key, value.into()));
        self
    }

    #[must_use]
    pub fn service(&self) -> SonosService {
        self.service
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn args(&self) -> &[(&'static str, String)] {
        &self.args
    }

    /// Request body. Sonos refuses bodies with whitespace before the root
    /// element, so this is one line.
    #[must_use]
    pub fn envelope(&self) -> String {
        let mut body = format!(
            r#"<?xml version="1.0" encoding="utf-8"?><s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/"><s:Body><u:{} xmlns:u="{}">"#,
            self.name,
            self.service.urn()
        );
        for (key, value) in &self.args {
            let _ = write!(body, "<{key}>{}</{key}>", escape_xml(value));
        }
        let _ = write!(body, "</u:{}></s:Body></s:Envelope>", self.name);
        body
    }

    /// Posts the action to `ip` and returns the response body.
    ///
    /// A fault in the body wins over the HTTP status, since players answer
    /// faults with 500.
    pub async fn send(&self, client: &Client, ip: &str) -> SoapResult<String> {
        let url = build_sonos_url(ip, self.service.control_path());
        let body = self.envelope();
        log::debug!("[SOAP] {}#{} -> {}", self.service.name(), self.name, url);
        log::trace!("[SOAP] Request body: {}", body);

        let started = std::time::Instant::now();
        let response = client
            .post(&url)
            .header("Content-Type", "text/xml; charset=\"utf-8\"")
            .header("SOAPAction", format!("\"{}#{}\"", self.service.urn(), self.name))
            .body(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        log::debug!("[SOAP] {} answered {} in {:?}", self.name, status, started.elapsed());

        if let Some(fault) = fault_description(&text) {
            return Err(SoapError::Fault(fault));
        }
        if !status.is_success() {
            return Err(SoapError::HttpStatus(status.as_u16(), text));
        }
        Ok(text)
    }
}

fn fault_description(xml: &str) -> Option<String> {
    if !xml.contains("Fault>") {
        return None;
    }
    let reason = extract_xml_text(xml, "faultstring").unwrap_or_else(|| "Unknown SOAP fault".into());
    Some(match extract_xml_text(xml, "errorCode") {
        Some(code) => format!("{} {}", reason, code.trim()),
        None => reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_actions_start_with_instance() {
        let action = SoapAction::transport("Seek")
            .arg("Unit", "TRACK_NR")
            .arg("Target", "3");

        assert_eq!(action.service(), SonosService::AVTransport);
        assert_eq!(action.name(), "Seek");
        assert_eq!(
            action.args(),
            [
                ("InstanceID", "0".to_string()),
                ("Unit", "TRACK_NR".to_string()),
                ("Target", "3".to_string()),
            ]
        );
    }

    #[test]
    fn topology_actions_take_no_arguments() {
        let action = SoapAction::topology("GetZoneGroupState");
        assert!(action.args().is_empty());
        assert!(action
            .envelope()
            .contains(r#"<u:GetZoneGroupState xmlns:u="urn:schemas-upnp-org:service:ZoneGroupTopology:1"></u:GetZoneGroupState>"#));
    }

    #[test]
    fn envelope_escapes_arguments_once() {
        let body = SoapAction::transport("SetAVTransportURI")
            .arg("CurrentURI", "http://host/a.mp3?x=1&y=2")
            .arg("CurrentURIMetaData", "<DIDL-Lite/>")
            .envelope();

        assert!(body.starts_with("<?xml"));
        assert!(body.contains("<InstanceID>0</InstanceID><CurrentURI>http://host/a.mp3?x=1&amp;y=2</CurrentURI>"));
        assert!(body.contains("<CurrentURIMetaData>&lt;DIDL-Lite/&gt;</CurrentURIMetaData>"));
        assert!(!body.contains("&amp;amp;"));
        assert!(body.ends_with("</u:SetAVTransportURI></s:Body></s:Envelope>"));
    }

    #[test]
    fn fault_includes_upnp_error_code() {
        let xml = r#"<s:Envelope><s:Body><s:Fault><faultcode>s:Client</faultcode><faultstring>UPnPError</faultstring><detail><UPnPError xmlns="urn:schemas-upnp-org:control-1-0"><errorCode>701</errorCode></UPnPError></detail></s:Fault></s:Body></s:Envelope>"#;

        let fault = SoapError::Fault(fault_description(xml).unwrap());
        assert_eq!(fault.to_string(), "SOAP fault: UPnPError 701");
        assert_eq!(fault.upnp_code(), Some(701));
        assert!(fault.is_transient());
    }

    #[test]
    fn ordinary_response_is_not_a_fault() {
        let xml = "<s:Envelope><s:Body><u:PlayResponse/></s:Body></s:Envelope>";
        assert!(fault_description(xml).is_none());
    }

    #[test]
    fn only_transition_codes_are_transient() {
        for code in TRANSIENT_UPNP_CODES {
            assert!(SoapError::Fault(format!("UPnPError {}", code)).is_transient());
        }
        assert!(!SoapError::Fault("UPnPError 402".into()).is_transient());
        assert!(!SoapError::Fault("UPnPError 7010".into()).is_transient());
        assert!(!SoapError::Fault("Unknown SOAP fault".into()).is_transient());
        assert!(!SoapError::missing("GetVolume", "CurrentVolume").is_transient());
    }
}
