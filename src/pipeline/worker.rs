//! Supervised execution of a whole pipeline invocation.
//!
//! The native libraries behind the engines are assumed unstable under
//! repeated in-process reinitialization, so an embedding application runs
//! each job on an isolated worker and treats abnormal termination as a tool
//! failure instead of letting the fault unwind through the orchestrator.
//! Cancellation granularity is the whole worker; nothing is cancelled
//! mid-segment.

use std::future::Future;

use log::error;

use crate::error::{DubError, Result};

/// Runs `job` on a supervised task. A panic inside the job surfaces as
/// [`DubError::ExternalTool`], never as an unwound panic in the caller.
pub async fn run_supervised<T, Fut>(job_name: &str, job: Fut) -> Result<T>
where
    Fut: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(job).await {
        Ok(result) => result,
        Err(join_err) => {
            error!("worker for job '{job_name}' terminated abnormally: {join_err}");
            Err(DubError::tool(
                "worker",
                format!("job '{job_name}' terminated abnormally: {join_err}"),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn successful_job_passes_through() {
        let out = run_supervised("ok", async { Ok(41 + 1) }).await.unwrap();
        assert_eq!(out, 42);
    }

    #[tokio::test]
    async fn job_error_is_propagated() {
        let err = run_supervised("fails", async {
            Err::<(), _>(DubError::NoSpeechDetected)
        })
        .await
        .unwrap_err();
        assert!(matches!(err, DubError::NoSpeechDetected));
    }

    #[tokio::test]
    async fn panicking_job_becomes_tool_failure() {
        let err = run_supervised("panics", async {
            panic!("native library crashed");
            #[allow(unreachable_code)]
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, DubError::ExternalTool { .. }));
    }
}
