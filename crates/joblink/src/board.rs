//! The job board client.

use serde_json::{Value, json};

use joblink_graphql::{Client, HttpTransport, Result, Session, Transport};

use crate::model::{Company, CreateJobInput, Job};
use crate::operations::{self, COMPANY_QUERY, CREATE_JOB, JOB_QUERY, JOBS_QUERY};

const TARGET: &str = "joblink::board";

/// Creates and loads jobs and companies.
///
/// Cloning is cheap; clones share one cache.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use joblink::{CreateJobInput, JobBoard, SharedSession};
///
/// let session = Arc::new(SharedSession::new());
/// let board = JobBoard::connect("http://localhost:9000/graphql", session.clone())?;
///
/// session.login(token);
/// let job = board.create_job(CreateJobInput::new("Engineer")).await?;
///
/// // Answered from the cache seeded by `create_job`.
/// let same = board.load_job(&job.id).await?;
/// ```
pub struct JobBoard<T, S> {
    client: Client<T, S>,
}

impl<T, S> std::fmt::Debug for JobBoard<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobBoard").field("client", &self.client).finish()
    }
}

impl<T, S> Clone for JobBoard<T, S> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
        }
    }
}

impl<S: Session> JobBoard<HttpTransport, S> {
    /// Connect to the service at `endpoint` over HTTP.
    pub fn connect(endpoint: impl Into<String>, session: S) -> Result<Self> {
        let transport = HttpTransport::new(endpoint)?;
        Self::new(transport, session)
    }
}

impl<T: Transport, S: Session> JobBoard<T, S> {
    /// Create a board over `transport` with the job board operations
    /// registered.
    pub fn new(transport: T, session: S) -> Result<Self> {
        Ok(Self::from_client(Client::new(
            operations::registry()?,
            session,
            transport,
        )))
    }

    /// Wrap an existing client.
    ///
    /// The client's registry must hold the operations from
    /// [`operations::registry`].
    pub fn from_client(client: Client<T, S>) -> Self {
        Self { client }
    }

    /// The underlying client.
    pub fn client(&self) -> &Client<T, S> {
        &self.client
    }

    /// Post a new job.
    ///
    /// The created job is also stored as the `JobQuery` result for its id,
    /// so a following [`load_job`](Self::load_job) does not hit the network.
    pub async fn create_job(&self, input: CreateJobInput) -> Result<Job> {
        let response = self
            .client
            .mutate_with(CREATE_JOB, json!({ "input": input }), |cache, data| {
                if let Some(id) = data.pointer("/job/id").filter(|id| !id.is_null()) {
                    cache.write_query(JOB_QUERY, &json!({ "id": id }), data);
                }
            })
            .await?;

        let job: Job = response.field("job")?;
        tracing::info!(target: TARGET, id = %job.id, "created job");
        Ok(job)
    }

    /// Load a company and its jobs.
    pub async fn load_company(&self, id: &str) -> Result<Company> {
        self.client
            .query(COMPANY_QUERY, json!({ "id": id }))
            .await?
            .field("company")
    }

    /// Load one job.
    pub async fn load_job(&self, id: &str) -> Result<Job> {
        self.client
            .query(JOB_QUERY, json!({ "id": id }))
            .await?
            .field("job")
    }

    /// Load every job. Always fetched from the service.
    pub async fn load_jobs(&self) -> Result<Vec<Job>> {
        self.client
            .query(JOBS_QUERY, Value::Null)
            .await?
            .field("jobs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joblink_graphql::{
        Anonymous, EntityKey, Error, GraphQLError, GraphQLResponse, OutgoingRequest,
        TransportError,
    };
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers every request with the same response and counts sends.
    struct Fixed {
        response: GraphQLResponse,
        sent: AtomicUsize,
        last: Mutex<Option<Value>>,
    }

    impl Fixed {
        fn new(response: GraphQLResponse) -> Self {
            Self {
                response,
                sent: AtomicUsize::new(0),
                last: Mutex::new(None),
            }
        }

        fn sent(&self) -> usize {
            self.sent.load(Ordering::SeqCst)
        }
    }

    impl Transport for Fixed {
        async fn send(
            &self,
            request: OutgoingRequest,
        ) -> std::result::Result<GraphQLResponse, TransportError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            *self.last.lock() = Some(request.body.variables);
            Ok(self.response.clone())
        }
    }

    fn created() -> GraphQLResponse {
        GraphQLResponse::from_data(json!({
            "job": {
                "__typename": "Job",
                "id": "42",
                "title": "Engineer",
                "description": "Rust",
                "company": {"__typename": "Company", "id": "c1", "name": "Acme"}
            }
        }))
    }

    #[tokio::test]
    async fn test_create_job_seeds_job_query() {
        let transport = Arc::new(Fixed::new(created()));
        let board = JobBoard::new(transport.clone(), Anonymous).unwrap();

        let job = board
            .create_job(CreateJobInput::new("Engineer").description("Rust"))
            .await
            .unwrap();
        assert_eq!(job.id, "42");
        assert_eq!(
            transport.last.lock().clone(),
            Some(json!({"input": {"title": "Engineer", "description": "Rust"}}))
        );

        let loaded = board.load_job("42").await.unwrap();
        assert_eq!(loaded, job);
        assert_eq!(transport.sent(), 1);
        assert!(board.client().cache().contains(&EntityKey::new("Job", "42")));
    }

    #[tokio::test]
    async fn test_load_jobs_always_fetches() {
        let transport = Arc::new(Fixed::new(GraphQLResponse::from_data(json!({
            "jobs": [
                {"__typename": "Job", "id": "1", "title": "A", "company": null},
                {"__typename": "Job", "id": "2", "title": "B",
                 "company": {"__typename": "Company", "id": "c1", "name": "Acme"}}
            ]
        }))));
        let board = JobBoard::new(transport.clone(), Anonymous).unwrap();

        let jobs = board.load_jobs().await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].company, None);
        board.load_jobs().await.unwrap();
        assert_eq!(transport.sent(), 2);
    }

    #[tokio::test]
    async fn test_load_job_not_found() {
        let transport = Fixed::new(GraphQLResponse {
            data: None,
            errors: vec![GraphQLError::new("job not found")],
            extensions: None,
        });
        let board = JobBoard::new(transport, Anonymous).unwrap();

        let err = board.load_job("999").await.unwrap_err();
        assert!(matches!(err, Error::Graph { .. }));
        assert_eq!(err.to_string(), "GraphQL error: job not found");
    }

    #[tokio::test]
    async fn test_null_job_with_errors_keeps_service_message() {
        let transport = Arc::new(Fixed::new(GraphQLResponse {
            data: Some(json!({"job": null})),
            errors: vec![GraphQLError::new("job not found")],
            extensions: None,
        }));
        let board = JobBoard::new(transport.clone(), Anonymous).unwrap();

        for _ in 0..2 {
            let err = board.load_job("999").await.unwrap_err();
            assert_eq!(err.graph_errors()[0].message, "job not found");
        }
        assert_eq!(transport.sent(), 2);
        assert!(board.client().cache().is_empty());
    }
}
