//! PlayReady envelope.
//!
//! The registration travels base64-encoded in the `x-titanium-drm-cdata`
//! header; the challenge travels inside a SOAP 1.1 `AcquireLicense` call.
//! Responses are the server's SOAP document and go to the CDM unchanged.
use std::io::Write;

use base64::Engine;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Serialize;

use crate::codec::registration::DeviceRegistration;
use crate::codec::EnvelopeCodec;
use crate::config::{DrmConfig, Vendor};
use crate::error::{Error, Result};
use crate::message::{AcquisitionOutcome, LicenseRequest, LicenseResponse};

const BASE64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

pub const CDATA_HEADER: &str = "x-titanium-drm-cdata";
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const SOAP_ACTION_HEADER: &str = "soapaction";

pub const CONTENT_TYPE: &str = "text/xml; charset=utf-8";
pub const ACQUIRE_LICENSE_ACTION: &str =
    "http://schemas.microsoft.com/DRM/2007/03/protocols/AcquireLicense";

pub const PROTOCOL_NS: &str = "http://schemas.microsoft.com/DRM/2007/03/protocols";
pub const SOAP_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";

#[derive(Serialize)]
struct CustomData {
    #[serde(rename = "LatensRegistration")]
    registration: DeviceRegistration,
}

/// Codec for a PlayReady license server.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayReadyCodec;

impl EnvelopeCodec for PlayReadyCodec {
    fn vendor(&self) -> Vendor {
        Vendor::PlayReady
    }

    fn build_request(&self, config: &DrmConfig, request: LicenseRequest) -> LicenseRequest {
        let cdata = custom_data(config);
        let envelope = soap_envelope(&request.body, Vec::new());
        finish_request(request, cdata, envelope)
    }

    fn parse_response(&self, _config: &DrmConfig, response: LicenseResponse) -> AcquisitionOutcome {
        if let Some(fault) = soap_fault(&response.body) {
            warn!("PlayReady license server returned a SOAP fault: {}", fault);
        }
        AcquisitionOutcome::Success(response.body)
    }
}

/// Base64 of the registration JSON for the cdata header.
pub fn custom_data(config: &DrmConfig) -> Result<String> {
    let json = serde_json::to_vec(&CustomData {
        registration: DeviceRegistration::for_config(config),
    })?;
    Ok(BASE64.encode(json))
}

/// Write the `AcquireLicense` SOAP envelope for `challenge` into `sink`.
pub fn soap_envelope<W: Write>(challenge: &[u8], sink: W) -> Result<W> {
    let challenge = BASE64.encode(challenge);
    let mut writer = Writer::new(sink);

    let mut envelope = BytesStart::new("soap:Envelope");
    envelope.push_attribute(("xmlns:xsi", XSI_NS));
    envelope.push_attribute(("xmlns:xsd", XSD_NS));
    envelope.push_attribute(("xmlns:soap", SOAP_NS));

    let mut acquire = BytesStart::new("AcquireLicense");
    acquire.push_attribute(("xmlns", PROTOCOL_NS));

    let events = [
        Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)),
        Event::Start(envelope),
        Event::Start(BytesStart::new("soap:Body")),
        Event::Start(acquire),
        Event::Start(BytesStart::new("challenge")),
        Event::Text(BytesText::new(&challenge)),
        Event::End(BytesEnd::new("challenge")),
        Event::End(BytesEnd::new("AcquireLicense")),
        Event::End(BytesEnd::new("soap:Body")),
        Event::End(BytesEnd::new("soap:Envelope")),
    ];
    for event in events {
        writer
            .write_event(event)
            .map_err(|e| Error::Envelope(e.to_string()))?;
    }

    Ok(writer.into_inner())
}

fn finish_request(
    mut request: LicenseRequest,
    cdata: Result<String>,
    envelope: Result<Vec<u8>>,
) -> LicenseRequest {
    match cdata.and_then(|cdata| envelope.map(|envelope| (cdata, envelope))) {
        Ok((cdata, envelope)) => {
            request.body = envelope;
            // Header names are case-insensitive on the wire.
            request.headers.retain(|name, _| {
                ![CDATA_HEADER, CONTENT_TYPE_HEADER, SOAP_ACTION_HEADER]
                    .iter()
                    .any(|envelope_header| name.eq_ignore_ascii_case(envelope_header))
            });
            request.headers.insert(CDATA_HEADER.to_string(), cdata);
            request
                .headers
                .insert(CONTENT_TYPE_HEADER.to_string(), CONTENT_TYPE.to_string());
            request
                .headers
                .insert(SOAP_ACTION_HEADER.to_string(), ACQUIRE_LICENSE_ACTION.to_string());
            debug!("Wrapped PlayReady license request ({} bytes)", request.body.len());
        }
        Err(e) => {
            // The transport will reject the empty request on its own.
            error!("Failed to build PlayReady license request: {}", e);
            request.body = Vec::new();
            request.headers.clear();
        }
    }
    request
}

/// Fault string of a SOAP fault response, if the body is one.
pub fn soap_fault(body: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(body).ok()?;
    let doc = roxmltree::Document::parse(text).ok()?;
    let fault = doc
        .descendants()
        .find(|n| n.tag_name().name() == "Fault")?;
    let message = fault
        .descendants()
        .find(|n| matches!(n.tag_name().name(), "faultstring" | "Text"))
        .and_then(|n| n.text())
        .unwrap_or("unknown fault");
    Some(message.trim().to_string())
}
