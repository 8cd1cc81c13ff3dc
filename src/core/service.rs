use crate::core::{
    Demande, DemandeStatus, HttpRequest, HttpTransport, NewDemande, Prestation, PrestationFilter,
};
use crate::utils::error::{ClientError, Result};
use crate::utils::validation::{validate_positive_number, Validate};
use serde::de::DeserializeOwned;

const PRESTATIONS_PATH: &str = "/api/prestations";
const DEMANDES_PATH: &str = "/api/demandes";

/// Typed façade over the prestations and demandes endpoints.
///
/// Holds nothing but the transport: every call issues exactly one request,
/// nothing is cached, and failures are returned as-is without retry.
/// Dropping a returned future before it resolves abandons the request.
pub struct PrestationsService<T: HttpTransport> {
    transport: T,
}

impl<T: HttpTransport> PrestationsService<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// `GET /api/prestations`, in server order.
    pub async fn list_prestations(&self) -> Result<Vec<Prestation>> {
        let prestations: Vec<Prestation> = self
            .fetch(HttpRequest::get(PRESTATIONS_PATH), "prestation list")
            .await?;
        tracing::debug!("Fetched {} prestations", prestations.len());
        Ok(prestations)
    }

    /// `GET /api/prestations?category=..&search=..`. An empty filter issues the
    /// same request as [`list_prestations`](Self::list_prestations).
    pub async fn search_prestations(&self, filter: &PrestationFilter) -> Result<Vec<Prestation>> {
        let request = HttpRequest::get(PRESTATIONS_PATH).with_query(filter.query_pairs());
        let prestations: Vec<Prestation> = self.fetch(request, "prestation list").await?;
        tracing::debug!(
            "Fetched {} prestations for filter {:?}",
            prestations.len(),
            filter
        );
        Ok(prestations)
    }

    /// `GET /api/prestations/{id}`. An unknown id surfaces as
    /// `ClientError::HttpStatus` with the server's status (404).
    pub async fn get_prestation(&self, id: u64) -> Result<Prestation> {
        validate_positive_number("prestation id", id, 1)?;
        let path = format!("{}/{}", PRESTATIONS_PATH, id);
        self.fetch(HttpRequest::get(path), "prestation").await
    }

    /// `POST /api/demandes`. Not idempotent: each call creates a new record.
    pub async fn create_demande(&self, demande: &NewDemande) -> Result<Demande> {
        let body = serde_json::to_vec(demande).map_err(ClientError::Encode)?;
        let created: Demande = self
            .fetch(HttpRequest::post_json(DEMANDES_PATH, body), "demande")
            .await?;
        created.validate()?;

        if created.statut != DemandeStatus::EnCours {
            tracing::warn!(
                "Demande {} was created with status '{}' instead of '{}'",
                created.id,
                created.statut,
                DemandeStatus::EnCours
            );
        }
        tracing::info!(
            "Created demande {} for prestation {}",
            created.id,
            created.prestation_id
        );
        Ok(created)
    }

    /// `GET /api/demandes`.
    ///
    /// `user_id` is not sent: the server scopes the list to the caller's
    /// session, and the result is returned unfiltered.
    pub async fn list_demandes(&self, user_id: u64) -> Result<Vec<Demande>> {
        tracing::debug!("Listing demandes on behalf of user {}", user_id);
        let demandes: Vec<Demande> = self
            .fetch(HttpRequest::get(DEMANDES_PATH), "demande list")
            .await?;
        for demande in &demandes {
            demande.validate()?;
        }
        Ok(demandes)
    }

    /// `GET /api/demandes/{id}`. Re-fetching is the only way to observe a
    /// status change.
    pub async fn get_demande(&self, id: u64) -> Result<Demande> {
        validate_positive_number("demande id", id, 1)?;
        let path = format!("{}/{}", DEMANDES_PATH, id);
        let demande: Demande = self.fetch(HttpRequest::get(path), "demande").await?;
        demande.validate()?;
        Ok(demande)
    }

    async fn fetch<R: DeserializeOwned>(&self, request: HttpRequest, context: &str) -> Result<R> {
        tracing::debug!("{} {}", request.method, request.path);
        let method = request.method;
        let path = request.path.clone();

        let response = self.transport.send(request).await?;
        tracing::debug!("{} {} -> {}", method, path, response.status);

        if !response.status.is_success() {
            tracing::warn!("{} {} failed with status {}", method, path, response.status);
            return Err(ClientError::HttpStatus {
                status: response.status.0,
                body: response.body_text(),
            });
        }

        serde_json::from_slice(&response.body).map_err(|source| ClientError::Decode {
            context: context.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{HttpResponse, Method, StatusCode};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct StubTransport {
        responses: Arc<Mutex<VecDeque<Result<HttpResponse>>>>,
        requests: Arc<Mutex<Vec<HttpRequest>>>,
    }

    impl StubTransport {
        async fn respond(&self, status: u16, body: serde_json::Value) {
            self.responses.lock().await.push_back(Ok(HttpResponse {
                status: StatusCode(status),
                body: serde_json::to_vec(&body).unwrap(),
            }));
        }

        async fn respond_raw(&self, status: u16, body: &str) {
            self.responses.lock().await.push_back(Ok(HttpResponse {
                status: StatusCode(status),
                body: body.as_bytes().to_vec(),
            }));
        }

        async fn fail(&self, message: &str) {
            self.responses
                .lock()
                .await
                .push_back(Err(ClientError::Transport {
                    message: message.to_string(),
                }));
        }

        async fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().await.clone()
        }
    }

    #[async_trait::async_trait]
    impl HttpTransport for StubTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
            self.requests.lock().await.push(request);
            self.responses
                .lock()
                .await
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::Transport {
                    message: "no scripted response".to_string(),
                }))
        }
    }

    fn emergency_fund() -> serde_json::Value {
        json!({
            "id": 3,
            "nom": "Emergency Fund",
            "categorie": "financial",
            "description": "One-off support",
            "montantMax": "$500",
            "duree": "1 mois",
            "conditions": "Proof of income",
            "couleur": "orange",
            "icone": "wallet"
        })
    }

    fn demande_json(id: u64, statut: &str) -> serde_json::Value {
        json!({
            "id": id,
            "prestationId": 3,
            "userId": 7,
            "statut": statut,
            "dateCreation": "2024-03-01T10:00:00Z",
            "dateMiseAJour": "2024-03-01T10:00:00Z",
            "motif": "Loss of income",
            "documents": []
        })
    }

    #[tokio::test]
    async fn test_list_prestations_issues_single_get() {
        let transport = StubTransport::default();
        transport.respond(200, json!([emergency_fund()])).await;
        let service = PrestationsService::new(transport.clone());

        let prestations = service.list_prestations().await.unwrap();

        assert_eq!(prestations.len(), 1);
        assert_eq!(prestations[0].nom, "Emergency Fund");
        let requests = transport.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(requests[0].path, "/api/prestations");
        assert!(requests[0].query.is_empty());
    }

    #[tokio::test]
    async fn test_empty_lists_are_not_errors() {
        let transport = StubTransport::default();
        transport.respond(200, json!([])).await;
        transport.respond(200, json!([])).await;
        let service = PrestationsService::new(transport);

        assert!(service.list_prestations().await.unwrap().is_empty());
        assert!(service.list_demandes(7).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_prestation_not_found() {
        let transport = StubTransport::default();
        transport.respond_raw(404, "no prestation 999").await;
        let service = PrestationsService::new(transport);

        let err = service.get_prestation(999).await.unwrap_err();

        assert!(err.is_not_found());
        match err {
            ClientError::HttpStatus { body, .. } => assert_eq!(body, "no prestation 999"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_prestation_rejects_zero_without_request() {
        let transport = StubTransport::default();
        let service = PrestationsService::new(transport.clone());

        let err = service.get_prestation(0).await.unwrap_err();

        assert!(matches!(err, ClientError::ValidationError { .. }));
        assert!(transport.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_retried() {
        let transport = StubTransport::default();
        transport.fail("connection refused").await;
        transport.respond(200, json!([])).await;
        let service = PrestationsService::new(transport.clone());

        let err = service.list_prestations().await.unwrap_err();

        assert!(matches!(err, ClientError::Transport { .. }));
        assert_eq!(transport.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn test_shape_mismatch_fails_fast() {
        let transport = StubTransport::default();
        transport.respond(200, json!({"id": 3, "nom": "Partial"})).await;
        let service = PrestationsService::new(transport);

        let err = service.get_prestation(3).await.unwrap_err();

        match err {
            ClientError::Decode { context, .. } => assert_eq!(context, "prestation"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_demande_posts_partial_payload() {
        let transport = StubTransport::default();
        transport.respond(201, demande_json(101, "en_cours")).await;
        let service = PrestationsService::new(transport.clone());

        let created = service
            .create_demande(&NewDemande::new(3, 7, "Loss of income"))
            .await
            .unwrap();

        assert_eq!(created.id, 101);
        assert_eq!(created.statut, DemandeStatus::EnCours);
        assert_eq!(created.date_creation, created.date_mise_a_jour);

        let requests = transport.requests().await;
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].path, "/api/demandes");
        let sent: serde_json::Value =
            serde_json::from_slice(requests[0].body.as_ref().unwrap()).unwrap();
        assert_eq!(sent["prestationId"], 3);
        assert_eq!(sent["userId"], 7);
        assert_eq!(sent["motif"], "Loss of income");
    }

    #[tokio::test]
    async fn test_create_demande_twice_sends_two_requests() {
        let transport = StubTransport::default();
        transport.respond(201, demande_json(101, "en_cours")).await;
        transport.respond(201, demande_json(102, "en_cours")).await;
        let service = PrestationsService::new(transport.clone());
        let payload = NewDemande::new(3, 7, "Loss of income");

        let first = service.create_demande(&payload).await.unwrap();
        let second = service.create_demande(&payload).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(transport.requests().await.len(), 2);
    }

    #[tokio::test]
    async fn test_list_demandes_does_not_send_user_id() {
        let transport = StubTransport::default();
        transport
            .respond(200, json!([demande_json(1, "approuvee"), demande_json(2, "refusee")]))
            .await;
        let service = PrestationsService::new(transport.clone());

        let demandes = service.list_demandes(42).await.unwrap();

        assert_eq!(demandes.len(), 2);
        assert!(demandes.iter().all(Demande::is_settled));
        let requests = transport.requests().await;
        assert_eq!(requests[0].path, "/api/demandes");
        assert!(requests[0].query.is_empty());
    }

    #[tokio::test]
    async fn test_search_prestations_sends_filter_as_query() {
        let transport = StubTransport::default();
        transport.respond(200, json!([emergency_fund()])).await;
        let service = PrestationsService::new(transport.clone());
        let filter = PrestationFilter {
            categorie: Some("financial".to_string()),
            search: None,
        };

        service.search_prestations(&filter).await.unwrap();

        let requests = transport.requests().await;
        assert_eq!(
            requests[0].query,
            vec![("category".to_string(), "financial".to_string())]
        );
    }

    #[tokio::test]
    async fn test_get_demande_rejects_inconsistent_timestamps() {
        let transport = StubTransport::default();
        let mut body = demande_json(9, "approuvee");
        body["dateMiseAJour"] = json!("2024-02-01T10:00:00Z");
        transport.respond(200, body).await;
        let service = PrestationsService::new(transport.clone());

        let err = service.get_demande(9).await.unwrap_err();

        assert!(matches!(err, ClientError::InvalidResponse { .. }));
        assert_eq!(transport.requests().await[0].path, "/api/demandes/9");
    }
}
