//! Ordered command plans for multi-step player sequences.
//!
//! A [`Plan`] is a list of stages run one after another. Steps inside a stage
//! have no ordering between them and run concurrently; any data dependency
//! (content before seek, seek before play) is expressed by putting the steps
//! in separate stages. Building a plan is pure, so the exact command order of
//! every restore and notification can be asserted without a player.

use std::future::Future;
use std::time::Duration;

use futures::future::try_join_all;

use crate::error::{InterludeResult, RemoteContext};
use crate::sonos::soap::SoapResult;
use crate::sonos::traits::SonosClient;
use crate::sonos::types::SeekTarget;

/// One player command (or pause) inside a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    SetTransportUri {
        ip: String,
        uri: String,
        metadata: String,
    },
    Seek {
        ip: String,
        target: SeekTarget,
    },
    SetVolume {
        ip: String,
        volume: u8,
    },
    SetMute {
        ip: String,
        mute: bool,
    },
    Play {
        ip: String,
    },
    Wait(Duration),
}

impl Step {
    /// SOAP action name, used in errors and logs.
    #[must_use]
    pub fn action(&self) -> &'static str {
        match self {
            Self::SetTransportUri { .. } => "SetAVTransportURI",
            Self::Seek { .. } => "Seek",
            Self::SetVolume { .. } => "SetVolume",
            Self::SetMute { .. } => "SetMute",
            Self::Play { .. } => "Play",
            Self::Wait(_) => "Wait",
        }
    }

    async fn execute(&self, client: &dyn SonosClient) -> SoapResult<()> {
        match self {
            Self::SetTransportUri { ip, uri, metadata } => {
                client.set_av_transport_uri(ip, uri, metadata).await
            }
            Self::Seek { ip, target } => client.seek(ip, target).await,
            Self::SetVolume { ip, volume } => client.set_speaker_volume(ip, *volume).await,
            Self::SetMute { ip, mute } => client.set_speaker_mute(ip, *mute).await,
            Self::Play { ip } => client.play(ip).await,
            Self::Wait(duration) => {
                tokio::time::sleep(*duration).await;
                Ok(())
            }
        }
    }
}

/// What a failed step does to the rest of the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the plan and return the error.
    Required,
    /// Log a warning and carry on.
    BestEffort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub step: Step,
    pub policy: FailurePolicy,
}

/// Steps that may run concurrently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stage {
    pub steps: Vec<PlannedStep>,
}

/// An ordered list of stages executed against one household.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    operation: &'static str,
    stages: Vec<Stage>,
}

impl Plan {
    /// Creates an empty plan; `operation` names it in errors.
    #[must_use]
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            stages: Vec::new(),
        }
    }

    /// Appends a required single-step stage.
    pub fn then(&mut self, step: Step) -> &mut Self {
        self.push(vec![step], FailurePolicy::Required)
    }

    /// Appends a single-step stage whose failure is only logged.
    pub fn then_best_effort(&mut self, step: Step) -> &mut Self {
        self.push(vec![step], FailurePolicy::BestEffort)
    }

    /// Appends a pause, skipped when `duration` is zero.
    pub fn then_wait(&mut self, duration: Duration) -> &mut Self {
        if duration.is_zero() {
            return self;
        }
        self.then(Step::Wait(duration))
    }

    /// Appends a stage of required steps that run concurrently.
    ///
    /// Nothing is appended when `steps` is empty.
    pub fn then_all(&mut self, steps: impl IntoIterator<Item = Step>) -> &mut Self {
        self.push(steps.into_iter().collect(), FailurePolicy::Required)
    }

    fn push(&mut self, steps: Vec<Step>, policy: FailurePolicy) -> &mut Self {
        if !steps.is_empty() {
            self.stages.push(Stage {
                steps: steps
                    .into_iter()
                    .map(|step| PlannedStep { step, policy })
                    .collect(),
            });
        }
        self
    }

    #[must_use]
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// All steps in execution order (stage by stage).
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.stages.iter().flat_map(|s| s.steps.iter().map(|p| &p.step))
    }

    /// Runs every stage in order.
    ///
    /// # Errors
    /// The first failing required step, wrapped with the plan's operation name.
    /// Steps of the same stage that already started still finish.
    pub async fn run(&self, client: &dyn SonosClient) -> InterludeResult<()> {
        for stage in &self.stages {
            try_join_all(stage.steps.iter().map(|planned| self.run_step(client, planned))).await?;
        }
        Ok(())
    }

    async fn run_step(&self, client: &dyn SonosClient, planned: &PlannedStep) -> InterludeResult<()> {
        let step = &planned.step;
        match planned.policy {
            FailurePolicy::Required => step.execute(client).await.during(self.operation, step.action()),
            FailurePolicy::BestEffort => {
                best_effort(step.action(), step.execute(client)).await;
                Ok(())
            }
        }
    }
}

/// Awaits `future`, logging and discarding a failure.
///
/// Returns `None` when the operation failed. Reserved for steps whose failure
/// leaves the player in an acceptable state, such as seeking inside content
/// that was just restored.
pub async fn best_effort<T, F>(label: &str, future: F) -> Option<T>
where
    F: Future<Output = SoapResult<T>>,
{
    match future.await {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("[Pipeline] {} failed, continuing: {}", label, e);
            None
        }
    }
}
