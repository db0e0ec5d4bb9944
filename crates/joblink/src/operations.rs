//! The job board's GraphQL documents.
//!
//! Every selection asks for `__typename` so jobs and companies normalize in
//! the result cache.

use joblink_graphql::{FetchPolicy, Fragment, Operation, OperationRegistry, Result};

/// Name of the shared job fields fragment.
pub const JOB_DETAIL: &str = "JobDetail";
/// Name of the create-job mutation.
pub const CREATE_JOB: &str = "CreateJob";
/// Name of the single-company query.
pub const COMPANY_QUERY: &str = "CompanyQuery";
/// Name of the single-job query.
pub const JOB_QUERY: &str = "JobQuery";
/// Name of the job listing query.
pub const JOBS_QUERY: &str = "jobsQuery";

const JOB_DETAIL_FRAGMENT: &str = r#"
    fragment JobDetail on Job {
        __typename
        id
        title
        description
        company {
            __typename
            id
            name
        }
    }
"#;

const CREATE_JOB_MUTATION: &str = r#"
    mutation CreateJob($input: CreateJobInput) {
        job: createJob(input: $input) {
            ...JobDetail
        }
    }
"#;

const COMPANY_QUERY_DOCUMENT: &str = r#"
    query CompanyQuery($id: ID!) {
        company(id: $id) {
            __typename
            id
            name
            description
            jobs {
                __typename
                id
                title
            }
        }
    }
"#;

const JOB_QUERY_DOCUMENT: &str = r#"
    query JobQuery($id: ID!) {
        job(id: $id) {
            ...JobDetail
        }
    }
"#;

const JOBS_QUERY_DOCUMENT: &str = r#"
    query jobsQuery {
        jobs {
            __typename
            id
            title
            company {
                __typename
                id
                name
            }
        }
    }
"#;

/// Build a registry holding every job board operation.
pub fn registry() -> Result<OperationRegistry> {
    let mut registry = OperationRegistry::new();
    registry.register_fragment(Fragment::new(JOB_DETAIL, JOB_DETAIL_FRAGMENT))?;
    registry.register_operation(Operation::mutation(CREATE_JOB, CREATE_JOB_MUTATION))?;
    registry.register_operation(Operation::query(COMPANY_QUERY, COMPANY_QUERY_DOCUMENT))?;
    registry.register_operation(Operation::query(JOB_QUERY, JOB_QUERY_DOCUMENT))?;
    registry.register_operation(
        Operation::query(JOBS_QUERY, JOBS_QUERY_DOCUMENT).fetch_policy(FetchPolicy::NoCache),
    )?;
    Ok(registry)
}
