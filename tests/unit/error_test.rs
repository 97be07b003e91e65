//! Tests for error types

use compile_lane::core::{Diagnostics, HandleError, ArtifactHandle, PipelineError, SchedulerError};

#[test]
fn test_invalid_config_error() {
    let err = SchedulerError::InvalidConfig("render_delay_ms must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: render_delay_ms must be greater than 0"
    );
}

#[test]
fn test_no_runtime_error() {
    let err = SchedulerError::NoRuntime("not inside a tokio runtime".to_string());
    assert_eq!(format!("{}", err), "no runtime available: not inside a tokio runtime");
}

#[test]
fn test_pipeline_error_messages() {
    assert_eq!(
        PipelineError::NoOutput("out.stl".into()).to_string(),
        "no output from runner: expected out.stl"
    );
    assert_eq!(
        PipelineError::ToolInvocation("exit code 1".into()).to_string(),
        "tool invocation failed: exit code 1"
    );
    assert_eq!(
        PipelineError::OutputParse("truncated".into()).to_string(),
        "failed to parse output: truncated"
    );
}

#[test]
fn test_only_scheduler_outcomes_are_silent() {
    assert!(PipelineError::Superseded.is_silent());
    assert!(PipelineError::Cancelled.is_silent());
    assert!(!PipelineError::Abandoned.is_silent());
    assert!(!PipelineError::NoOutput("out.stl".into()).is_silent());
}

#[test]
fn test_tool_reported_error_exposes_diagnostics() {
    let err = PipelineError::ToolReported {
        message: "Parser error".into(),
        diagnostics: Some(Diagnostics {
            log_text: "ERROR: Parser error".into(),
            markers: Vec::new(),
        }),
    };
    assert_eq!(err.to_string(), "Parser error");
    assert_eq!(err.diagnostics().unwrap().log_text, "ERROR: Parser error");
    assert!(PipelineError::Cancelled.diagnostics().is_none());
}

#[test]
fn test_handle_errors() {
    let handle = ArtifactHandle("artifact:42".into());
    assert_eq!(
        HandleError::AlreadyReleased(handle.clone()).to_string(),
        "artifact handle already released: artifact:42"
    );
    assert_eq!(
        HandleError::UnknownHandle(handle).to_string(),
        "unknown artifact handle: artifact:42"
    );
}
