//! Provisioning state machine.
//!
//! Policy state moves none → pending → confirmed → invalidated. The
//! pending (temporary) key exists only inside [`Session::provision`]
//! between the two round-trips and is carried in the request body, so
//! a policy key is never attached to a command header before phase 2
//! confirms it. An authorization-expired signal invalidates the
//! confirmed key and the session re-enters the machine from the start.

use crate::error::{EasError, EasResult};
use crate::session::{ExecuteOptions, Session};
use crate::store::StateStore;
use crate::transport::HttpClient;
use easync_protocol::{
    device_information_request, parse_provision, provision_acknowledge, provision_request,
    Command, DeviceInformation,
};
use easync_wbxml::{Element, WbxmlError};
use tracing::{debug, info};

/// Acceptance code sent in the phase 2 acknowledgement.
const ACK_ACCEPTED: u8 = 1;

impl<C: HttpClient, S: StateStore> Session<C, S> {
    /// Runs the two-phase provisioning handshake and commits the final
    /// policy key.
    ///
    /// Phase 1 requests the policy and yields a temporary key; phase 2
    /// acknowledges acceptance under that key and yields the final
    /// one. Any non-success status restores the previous key and
    /// surfaces the mapped status; a transport failure leaves the
    /// previous key untouched. On success a best-effort device
    /// information command is sent, whose failure never invalidates
    /// the fresh provisioning.
    pub async fn provision(&self) -> EasResult<String> {
        let previous = self.policy_key();
        let options = ExecuteOptions {
            skip_policy_key: true,
            no_reprovision: true,
            ..ExecuteOptions::default()
        };

        let phase1 = self
            .provision_round_trip(&provision_request(), &options)
            .await?;
        if phase1.remote_wipe {
            return Err(EasError::RemoteWipe);
        }
        if !phase1.status.is_success() {
            self.restore_policy_key(previous.as_deref())?;
            return Err(EasError::Policy {
                status: phase1.status,
            });
        }
        let temp_key = phase1.policy_key.ok_or_else(|| {
            EasError::Decode(WbxmlError::invalid_structure(
                "phase 1 provision response missing PolicyKey",
            ))
        })?;

        let phase2 = self
            .provision_round_trip(&provision_acknowledge(&temp_key, ACK_ACCEPTED), &options)
            .await?;
        if !phase2.status.is_success() {
            self.restore_policy_key(previous.as_deref())?;
            return Err(EasError::Policy {
                status: phase2.status,
            });
        }

        // Servers may refresh the key in the acknowledgement.
        let final_key = phase2.policy_key.unwrap_or(temp_key);
        self.commit_policy_key(&final_key)?;
        info!("provisioning confirmed");

        let info = DeviceInformation {
            user_agent: self.config().user_agent.clone(),
            ..DeviceInformation::default()
        };
        let settings_options = ExecuteOptions {
            no_reprovision: true,
            ..ExecuteOptions::default()
        };
        if let Err(error) = self
            .execute_with(
                Command::Settings,
                &device_information_request(&info),
                &settings_options,
            )
            .await
        {
            debug!(%error, "device information command failed, ignoring");
        }

        Ok(final_key)
    }

    /// Provisions only when no policy key is committed.
    pub async fn ensure_provisioned(&self) -> EasResult<()> {
        if self.policy_key().is_none() {
            self.provision().await?;
        }
        Ok(())
    }

    async fn provision_round_trip(
        &self,
        document: &Element,
        options: &ExecuteOptions,
    ) -> EasResult<easync_protocol::ProvisionResponse> {
        let response = self
            .execute_with(Command::Provision, document, options)
            .await?
            .ok_or_else(|| {
                EasError::Decode(WbxmlError::invalid_structure("empty provision response"))
            })?;
        Ok(parse_provision(&response)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccountConfig;
    use crate::store::{MemoryStore, StateStore};
    use crate::transport::{HttpResponse, MockHttpClient};
    use easync_ntlm::Credentials;
    use easync_protocol::{ProvisionStatus, POLICY_TYPE_WBXML};
    use easync_wbxml::Codepage;
    use std::sync::Arc;

    fn session(
        mock: Arc<MockHttpClient>,
        store: Arc<MemoryStore>,
    ) -> Session<MockHttpClient, MemoryStore> {
        let config = AccountConfig::new(
            "https://mail.example.com",
            Credentials::new("kim", "secret", "CORP"),
        );
        Session::new(config, mock, store).unwrap()
    }

    fn wbxml(doc: &Element) -> Vec<u8> {
        easync_wbxml::encode(doc).unwrap()
    }

    fn provision_response(status: &str, key: Option<&str>) -> Vec<u8> {
        let mut policy = Element::new(Codepage::Provision, "Policy")
            .with_text(Codepage::Provision, "PolicyType", POLICY_TYPE_WBXML)
            .with_text(Codepage::Provision, "Status", status);
        if let Some(key) = key {
            policy.push(Element::text(Codepage::Provision, "PolicyKey", key));
        }
        wbxml(
            &Element::new(Codepage::Provision, "Provision")
                .with_text(Codepage::Provision, "Status", "1")
                .with(Element::new(Codepage::Provision, "Policies").with(policy)),
        )
    }

    fn settings_ok() -> Vec<u8> {
        wbxml(
            &Element::new(Codepage::Settings, "Settings").with_text(
                Codepage::Settings,
                "Status",
                "1",
            ),
        )
    }

    fn discovery() -> HttpResponse {
        HttpResponse::status(200).with_header("MS-ASProtocolVersions", "12.1,14.0,14.1")
    }

    #[tokio::test]
    async fn two_phase_success_commits_final_key() {
        let mock = Arc::new(MockHttpClient::new());
        let store = Arc::new(MemoryStore::new());
        mock.push_response(discovery());
        mock.push_response(HttpResponse::ok(provision_response("1", Some("TEMP"))));
        mock.push_response(HttpResponse::ok(provision_response("1", Some("FINAL"))));
        mock.push_response(HttpResponse::ok(settings_ok()));

        let session = session(Arc::clone(&mock), Arc::clone(&store));
        let key = session.provision().await.unwrap();
        assert_eq!(key, "FINAL");
        assert_eq!(session.policy_key().as_deref(), Some("FINAL"));
        assert_eq!(store.policy_key().unwrap().as_deref(), Some("FINAL"));

        // Neither provisioning request carried a policy key header,
        // and the temporary key rode only in the phase 2 body.
        let requests = mock.requests();
        assert_eq!(requests[1].header("X-MS-PolicyKey"), None);
        assert_eq!(requests[2].header("X-MS-PolicyKey"), None);
        let phase2 = easync_wbxml::decode(&requests[2].body).unwrap();
        assert_eq!(
            phase2
                .descendant(&["Policies", "Policy", "PolicyKey"])
                .unwrap()
                .value()
                .unwrap(),
            "TEMP"
        );
        // The device information command runs after confirmation, with
        // the fresh key attached.
        assert_eq!(requests[3].header("X-MS-PolicyKey"), Some("FINAL"));
    }

    #[tokio::test]
    async fn phase1_failure_is_terminal() {
        let mock = Arc::new(MockHttpClient::new());
        let store = Arc::new(MemoryStore::new());
        store.set_policy_key(Some("OLD")).unwrap();
        mock.push_response(discovery());
        mock.push_response(HttpResponse::ok(provision_response("2", None)));

        let session = session(Arc::clone(&mock), Arc::clone(&store));
        let err = session.provision().await.unwrap_err();
        assert!(matches!(
            err,
            EasError::Policy {
                status: ProvisionStatus::ProtocolError
            }
        ));
        // The previous key is restored.
        assert_eq!(store.policy_key().unwrap().as_deref(), Some("OLD"));
        // Phase 2 never ran.
        assert_eq!(mock.request_count(), 2);
    }

    #[tokio::test]
    async fn phase2_failure_restores_previous_key() {
        let mock = Arc::new(MockHttpClient::new());
        let store = Arc::new(MemoryStore::new());
        mock.push_response(discovery());
        mock.push_response(HttpResponse::ok(provision_response("1", Some("TEMP"))));
        mock.push_response(HttpResponse::ok(provision_response("6", None)));

        let session = session(Arc::clone(&mock), Arc::clone(&store));
        let err = session.provision().await.unwrap_err();
        assert!(matches!(
            err,
            EasError::Policy {
                status: ProvisionStatus::InvalidPolicyKey
            }
        ));
        assert_eq!(session.policy_key(), None);
    }

    #[tokio::test]
    async fn device_information_failure_is_ignored() {
        let mock = Arc::new(MockHttpClient::new());
        let store = Arc::new(MemoryStore::new());
        mock.push_response(discovery());
        mock.push_response(HttpResponse::ok(provision_response("1", Some("TEMP"))));
        mock.push_response(HttpResponse::ok(provision_response("1", Some("FINAL"))));
        mock.push_response(HttpResponse::status(500));

        let session = session(Arc::clone(&mock), Arc::clone(&store));
        let key = session.provision().await.unwrap();
        assert_eq!(key, "FINAL");
        assert_eq!(session.policy_key().as_deref(), Some("FINAL"));
    }

    #[tokio::test]
    async fn remote_wipe_is_surfaced() {
        let mock = Arc::new(MockHttpClient::new());
        let store = Arc::new(MemoryStore::new());
        mock.push_response(discovery());
        mock.push_response(HttpResponse::ok(wbxml(
            &Element::new(Codepage::Provision, "Provision")
                .with_text(Codepage::Provision, "Status", "1")
                .with(Element::new(Codepage::Provision, "RemoteWipe")),
        )));

        let session = session(Arc::clone(&mock), Arc::clone(&store));
        assert!(matches!(
            session.provision().await.unwrap_err(),
            EasError::RemoteWipe
        ));
    }

    #[tokio::test]
    async fn ensure_provisioned_skips_when_key_present() {
        let mock = Arc::new(MockHttpClient::new());
        let store = Arc::new(MemoryStore::new());
        store.set_policy_key(Some("KEY")).unwrap();

        let session = session(Arc::clone(&mock), Arc::clone(&store));
        session.ensure_provisioned().await.unwrap();
        assert_eq!(mock.request_count(), 0);
    }
}
