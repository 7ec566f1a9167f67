use crate::config::ErrorsConfig;
use crate::exception::Exception;
use crate::problem::{ProblemError, ProblemType};
use std::sync::Arc;

pub mod builtins;

pub use builtins::{MethodNotAllowedStep, RedirectStep};

/// One rewrite applied to a raised exception before it is turned into a
/// [`ProblemError`].
///
/// Steps run in order and each sees what the previous one left behind. A
/// step may also replace the exception altogether, for example to map an
/// application error onto a recognized HTTP status.
///
/// # Example
/// ```
/// use errors_handler::exception::{Exception, HttpException};
/// use errors_handler::normalize::NormalizeStep;
///
/// struct MissingRowStep;
///
/// impl NormalizeStep for MissingRowStep {
///     fn normalize(&self, exception: &mut Exception) {
///         if let Exception::Unhandled(err) = exception {
///             if err.to_string() == "row not found" {
///                 *exception = HttpException::not_found().into();
///             }
///         }
///     }
/// }
/// ```
pub trait NormalizeStep: Send + Sync + 'static {
    fn normalize(&self, exception: &mut Exception);
}

/// Ordered pipeline of [`NormalizeStep`]s ending in the conversion to
/// [`ProblemError`].
#[derive(Clone)]
pub struct NormalizationChain {
    steps: Vec<Arc<dyn NormalizeStep>>,
}

impl Default for NormalizationChain {
    fn default() -> Self {
        Self {
            steps: vec![Arc::new(MethodNotAllowedStep), Arc::new(RedirectStep)],
        }
    }
}

impl NormalizationChain {
    /// A chain with no rewrite steps, only the terminal conversion.
    pub fn empty() -> Self {
        Self { steps: Vec::new() }
    }

    /// Add a step ahead of every step already in the chain.
    pub fn with_step(mut self, step: impl NormalizeStep) -> Self {
        self.steps.insert(0, Arc::new(step));
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Turn any raised exception into a problem of type `target`.
    ///
    /// Problems pass through unchanged. Unrecognized failures become a 500
    /// whose detail is the full error chain in debug mode and the configured
    /// generic message otherwise; they are logged exactly once here.
    pub fn normalize(
        &self,
        exception: Exception,
        target: &ProblemType,
        config: &ErrorsConfig,
    ) -> ProblemError {
        let mut exception = match reject_out_of_range(exception) {
            Exception::Problem(problem) => return problem,
            exception => exception,
        };
        for step in &self.steps {
            step.normalize(&mut exception);
        }

        match reject_out_of_range(exception) {
            Exception::Problem(problem) => problem,
            Exception::Http(exc) => {
                let (status, description, headers, payload) = exc.into_parts();
                let mut problem = target.problem(status, description);
                problem.headers = headers;
                problem.response = payload;
                problem
            }
            Exception::Unhandled(err) => {
                tracing::error!("Unhandled exception: {:?}", err);
                let detail = if config.debug {
                    format!("{err:?}")
                } else {
                    config.default_message.clone()
                };
                target.problem(axum::http::StatusCode::INTERNAL_SERVER_ERROR, detail)
            }
        }
    }
}

/// Statuses outside 100..=599 cannot be written to the wire; such
/// exceptions are treated as unrecognized failures.
fn reject_out_of_range(exception: Exception) -> Exception {
    let status = match &exception {
        Exception::Http(exc) => exc.status(),
        Exception::Problem(problem) => problem.status,
        Exception::Unhandled(_) => return exception,
    };
    if (100..=599).contains(&status.as_u16()) {
        return exception;
    }
    Exception::Unhandled(anyhow::anyhow!(
        "status {} is outside 100..=599: {}",
        status.as_u16(),
        exception
    ))
}
