//! Provision and Settings (device information) message shapes.

use easync_wbxml::{Codepage, Element, WbxmlResult};

use crate::folder::missing;
use crate::status::ProvisionStatus;

/// The policy type negotiated with Exchange 2007 and later.
pub const POLICY_TYPE_WBXML: &str = "MS-EAS-Provisioning-WBXML";

/// The parsed result of one Provision round-trip.
#[derive(Debug, Clone)]
pub struct ProvisionResponse {
    /// Effective status: the per-policy status when present, otherwise
    /// the command status.
    pub status: ProvisionStatus,
    /// The policy key issued by the server (temporary in phase 1,
    /// final in phase 2).
    pub policy_key: Option<String>,
    /// The policy document of a phase 1 response.
    pub policy_data: Option<Element>,
    /// True when the server demanded a remote wipe.
    pub remote_wipe: bool,
}

/// Build the phase 1 request: ask for the current security policy.
pub fn provision_request() -> Element {
    Element::new(Codepage::Provision, "Provision").with(
        Element::new(Codepage::Provision, "Policies").with(
            Element::new(Codepage::Provision, "Policy").with_text(
                Codepage::Provision,
                "PolicyType",
                POLICY_TYPE_WBXML,
            ),
        ),
    )
}

/// Build the phase 2 request: acknowledge the policy under the
/// temporary key with the given acceptance status (1 = accepted).
pub fn provision_acknowledge(temp_key: &str, ack_status: u8) -> Element {
    Element::new(Codepage::Provision, "Provision").with(
        Element::new(Codepage::Provision, "Policies").with(
            Element::new(Codepage::Provision, "Policy")
                .with_text(Codepage::Provision, "PolicyType", POLICY_TYPE_WBXML)
                .with_text(Codepage::Provision, "PolicyKey", temp_key)
                .with_text(Codepage::Provision, "Status", ack_status.to_string()),
        ),
    )
}

/// Parse a Provision response document.
pub fn parse_provision(root: &Element) -> WbxmlResult<ProvisionResponse> {
    let command_status = root
        .child_parsed::<u8>("Status")
        .map(ProvisionStatus::from_code)
        .ok_or_else(|| missing("Provision", "Status"))?;

    let remote_wipe = root.child("RemoteWipe").is_some();

    let policy = root.descendant(&["Policies", "Policy"]);
    let policy_status = policy
        .and_then(|p| p.child_parsed::<u8>("Status"))
        .map(ProvisionStatus::from_code);
    let policy_key = policy.and_then(|p| p.child_value("PolicyKey"));
    let policy_data = policy.and_then(|p| p.child("Data")).cloned();

    Ok(ProvisionResponse {
        status: policy_status.unwrap_or(command_status),
        policy_key,
        policy_data,
        remote_wipe,
    })
}

/// Device identity advertised through the Settings command.
#[derive(Debug, Clone)]
pub struct DeviceInformation {
    /// Device model string.
    pub model: String,
    /// Name shown in the server's device list.
    pub friendly_name: String,
    /// Operating system string.
    pub os: String,
    /// User agent string.
    pub user_agent: String,
}

impl Default for DeviceInformation {
    fn default() -> Self {
        Self {
            model: "easync".to_string(),
            friendly_name: "easync mail client".to_string(),
            os: "Android".to_string(),
            user_agent: "easync/0.3".to_string(),
        }
    }
}

/// Build a Settings request carrying the device information set.
pub fn device_information_request(info: &DeviceInformation) -> Element {
    Element::new(Codepage::Settings, "Settings").with(
        Element::new(Codepage::Settings, "DeviceInformation").with(
            Element::new(Codepage::Settings, "Set")
                .with_text(Codepage::Settings, "Model", &info.model)
                .with_text(Codepage::Settings, "FriendlyName", &info.friendly_name)
                .with_text(Codepage::Settings, "OS", &info.os)
                .with_text(Codepage::Settings, "UserAgent", &info.user_agent),
        ),
    )
}

/// Parse the status of a Settings response.
pub fn parse_settings_status(root: &Element) -> Option<u8> {
    root.child_parsed("Status")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase1_request_names_policy_type() {
        let req = provision_request();
        let policy = req.descendant(&["Policies", "Policy"]).unwrap();
        assert_eq!(policy.child_value("PolicyType").unwrap(), POLICY_TYPE_WBXML);
        assert!(policy.child("PolicyKey").is_none());
    }

    #[test]
    fn phase2_request_carries_key_and_ack() {
        let req = provision_acknowledge("3141592654", 1);
        let policy = req.descendant(&["Policies", "Policy"]).unwrap();
        assert_eq!(policy.child_value("PolicyKey").unwrap(), "3141592654");
        assert_eq!(policy.child_value("Status").unwrap(), "1");
    }

    fn response(command_status: &str, policy_status: Option<&str>, key: Option<&str>) -> Element {
        let mut policy = Element::new(Codepage::Provision, "Policy").with_text(
            Codepage::Provision,
            "PolicyType",
            POLICY_TYPE_WBXML,
        );
        if let Some(s) = policy_status {
            policy.push(Element::text(Codepage::Provision, "Status", s));
        }
        if let Some(k) = key {
            policy.push(Element::text(Codepage::Provision, "PolicyKey", k));
        }
        Element::new(Codepage::Provision, "Provision")
            .with_text(Codepage::Provision, "Status", command_status)
            .with(Element::new(Codepage::Provision, "Policies").with(policy))
    }

    #[test]
    fn parse_phase1_response() {
        let root = response("1", Some("1"), Some("1307199584"));
        let parsed = parse_provision(&root).unwrap();
        assert!(parsed.status.is_success());
        assert_eq!(parsed.policy_key.as_deref(), Some("1307199584"));
        assert!(!parsed.remote_wipe);
    }

    #[test]
    fn policy_status_wins_over_command_status() {
        let root = response("1", Some("5"), None);
        let parsed = parse_provision(&root).unwrap();
        assert_eq!(parsed.status, ProvisionStatus::PolicyRefreshRequired);
    }

    #[test]
    fn command_status_used_when_no_policy_block() {
        let root = Element::new(Codepage::Provision, "Provision").with_text(
            Codepage::Provision,
            "Status",
            "2",
        );
        let parsed = parse_provision(&root).unwrap();
        assert_eq!(parsed.status, ProvisionStatus::ProtocolError);
        assert!(parsed.policy_key.is_none());
    }

    #[test]
    fn remote_wipe_detected() {
        let root = Element::new(Codepage::Provision, "Provision")
            .with_text(Codepage::Provision, "Status", "1")
            .with(Element::new(Codepage::Provision, "RemoteWipe"));
        assert!(parse_provision(&root).unwrap().remote_wipe);
    }

    #[test]
    fn device_information_shape() {
        let req = device_information_request(&DeviceInformation::default());
        let set = req.descendant(&["DeviceInformation", "Set"]).unwrap();
        assert!(set.child_value("Model").is_some());
        assert!(set.child_value("FriendlyName").is_some());
    }
}
