// ffdeck-core/tests/controller_tests.rs
//
// End-to-end flows through OperationController with a scripted runner.

mod common;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use common::{
    Reply, ScriptedRunner, is_audio_codec_query, is_encoder_query, is_json_probe, probe_json,
    touch,
};
use ffdeck_core::{
    ControllerEvent, CoreConfigBuilder, CoreError, FrameRatePreset, OperationController,
    OperationOutcome, OperationRequest, OperationState, OperationWorker, ResolutionPreset,
    SessionState, SessionStore,
};
use tempfile::{TempDir, tempdir};

fn controller(dir: &TempDir, runner: ScriptedRunner) -> OperationController<ScriptedRunner> {
    let config = CoreConfigBuilder::new()
        .state_file(dir.path().join("state/session.json"))
        .build();
    OperationController::new(config, runner)
}

fn run(
    controller: &OperationController<ScriptedRunner>,
    request: OperationRequest,
) -> (OperationOutcome, Vec<ControllerEvent>) {
    let mut events = Vec::new();
    let outcome = controller.execute(request, &mut |event| events.push(event));
    (outcome, events)
}

fn seed_session(dir: &TempDir, source: &Path, audio: Option<&str>) -> SessionState {
    let state = SessionState {
        source_path: source.to_path_buf(),
        video_codec: "h264".to_string(),
        audio_codec: audio.map(str::to_string),
        container_format: "matroska".to_string(),
        start_time_offset_seconds: 0.0,
        extracted_audio_path: None,
    };
    SessionStore::new(dir.path().join("state/session.json"))
        .save(&state)
        .unwrap();
    state
}

fn expect_success(outcome: OperationOutcome) -> ffdeck_core::OperationReport {
    match outcome {
        OperationOutcome::Succeeded(report) => report,
        OperationOutcome::Failed(failure) => panic!("operation failed: {}", failure.reason),
    }
}

fn expect_failure(outcome: OperationOutcome) -> ffdeck_core::OperationFailure {
    match outcome {
        OperationOutcome::Succeeded(report) => panic!("operation succeeded: {}", report.message),
        OperationOutcome::Failed(failure) => failure,
    }
}

#[test]
fn select_source_probes_and_writes_a_fresh_session() {
    let dir = tempdir().unwrap();
    let video = dir.path().join("clip.mov");
    touch(&video);
    let controller = controller(
        &dir,
        ScriptedRunner::new(|spec| {
            assert!(is_json_probe(spec));
            Reply::Stdout(probe_json(
                "h264",
                Some("aac"),
                "mov,mp4,m4a,3gp,3g2,mj2",
                (1920, 1080),
                "30/1",
            ))
        }),
    );

    let (outcome, events) = run(&controller, OperationRequest::SelectSource { path: video.clone() });
    let report = expect_success(outcome);
    assert_eq!(report.message, "Info saved for: clip.mov (00:00:10)");

    let stored = controller.session_store().load().unwrap();
    assert_eq!(Some(&stored), report.session.as_ref());
    assert_eq!(stored.source_path, fs::canonicalize(&video).unwrap());
    assert_eq!(stored.video_codec, "h264");
    assert_eq!(stored.audio_codec.as_deref(), Some("aac"));
    assert_eq!(stored.container_format, "mov");
    assert_eq!(stored.extracted_audio_path, None);

    let states: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ControllerEvent::StateChanged(s) => Some(*s),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        [
            OperationState::Validating,
            OperationState::Running,
            OperationState::Succeeded
        ]
    );
}

#[test]
fn selecting_a_new_source_clears_extracted_audio() {
    let dir = tempdir().unwrap();
    let old = dir.path().join("old.mkv");
    let new = dir.path().join("new.mkv");
    touch(&old);
    touch(&new);
    let mut state = seed_session(&dir, &old, Some("aac"));
    state.extracted_audio_path = Some(dir.path().join("output_audio.wav"));
    SessionStore::new(dir.path().join("state/session.json"))
        .save(&state)
        .unwrap();

    let controller = controller(
        &dir,
        ScriptedRunner::new(|_| {
            Reply::Stdout(probe_json("hevc", None, "matroska,webm", (3840, 2160), "24/1"))
        }),
    );
    let (outcome, events) = run(&controller, OperationRequest::SelectSource { path: new });
    let report = expect_success(outcome);

    let stored = controller.session_store().load().unwrap();
    assert_eq!(stored.extracted_audio_path, None);
    assert_eq!(stored.audio_codec, None);
    assert!(!report.warnings.is_empty());
    assert!(events
        .iter()
        .any(|e| matches!(e, ControllerEvent::Warning(w) if w.contains("No audio stream"))));
}

#[test]
fn audio_only_source_is_rejected_and_session_kept() {
    let dir = tempdir().unwrap();
    let old = dir.path().join("old.mkv");
    let song = dir.path().join("song.mp3");
    touch(&old);
    touch(&song);
    let before = seed_session(&dir, &old, Some("aac"));

    let controller = controller(
        &dir,
        ScriptedRunner::new(|_| {
            Reply::Stdout(
                r#"{"streams": [{"codec_type": "audio", "codec_name": "mp3"}], "format": {"format_name": "mp3"}}"#
                    .to_string(),
            )
        }),
    );
    let failure = expect_failure(run(&controller, OperationRequest::SelectSource { path: song }).0);

    assert!(matches!(failure.error, CoreError::NoVideoStream(_)));
    assert_eq!(controller.session_store().load(), Some(before));
}

#[test]
fn extract_audio_records_the_wav_path() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("clip.mkv");
    touch(&source);
    seed_session(&dir, &source, Some("aac"));

    let controller = controller(
        &dir,
        ScriptedRunner::new(|_| {
            Reply::StderrLines(vec![
                "size=    1024kB time=00:00:05.00 bitrate=1411.2kbits/s speed=100x".to_string(),
            ])
        }),
    );
    let (outcome, events) = run(&controller, OperationRequest::ExtractAudio);
    let report = expect_success(outcome);

    let expected = dir.path().join("output_audio.wav");
    assert_eq!(report.output_path.as_deref(), Some(expected.as_path()));
    let stored = controller.session_store().load().unwrap();
    assert_eq!(stored.extracted_audio_path, Some(expected));
    assert!(events
        .iter()
        .any(|e| matches!(e, ControllerEvent::Output(line) if line.starts_with("size="))));

    let calls = controller.runner().ffmpeg_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].arg_value("-acodec"), Some("pcm_s16le"));
}

#[test]
fn extract_audio_without_session_is_invalid_state() {
    let dir = tempdir().unwrap();
    let controller = controller(&dir, ScriptedRunner::new(|_| panic!("no process expected")));
    let failure = expect_failure(run(&controller, OperationRequest::ExtractAudio).0);
    assert!(matches!(failure.error, CoreError::InvalidState(_)));
}

#[test]
fn extract_audio_when_source_was_deleted_fails_validation() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("gone.mkv");
    seed_session(&dir, &source, Some("aac"));
    let controller = controller(&dir, ScriptedRunner::new(|_| panic!("no process expected")));

    let failure = expect_failure(run(&controller, OperationRequest::ExtractAudio).0);
    assert!(matches!(failure.error, CoreError::PreconditionFailed(_)));
    assert!(controller.runner().calls().is_empty());
}

#[test]
fn failed_tool_run_leaves_session_untouched_and_reports_tail() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("clip.mkv");
    touch(&source);
    let before = seed_session(&dir, &source, Some("aac"));

    let noisy: String = (1..=40).map(|i| format!("diagnostic {i}\n")).collect();
    let controller = controller(&dir, ScriptedRunner::new(move |_| Reply::Exit(1, noisy.clone())));
    let failure = expect_failure(run(&controller, OperationRequest::ExtractAudio).0);

    assert!(failure.reason.contains("exit code 1"));
    assert!(failure.reason.contains("diagnostic 40"));
    assert!(!failure.reason.contains("diagnostic 30\n"));
    assert_eq!(controller.session_store().load(), Some(before));
}

#[test]
fn replace_audio_retries_once_with_aac() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("clip.mkv");
    let audio = dir.path().join("voice.wav");
    touch(&source);
    touch(&audio);
    seed_session(&dir, &source, Some("opus"));

    let controller = controller(
        &dir,
        ScriptedRunner::new(|spec| {
            if is_audio_codec_query(spec) {
                Reply::Stdout("pcm_s16le\n".to_string())
            } else if spec.arg_value("-c:a") == Some("opus") {
                Reply::Exit(1, "Could not find tag for codec pcm_s16le".to_string())
            } else {
                Reply::StderrLines(Vec::new())
            }
        }),
    );
    let (outcome, events) = run(
        &controller,
        OperationRequest::ReplaceAudio {
            replacement: Some(audio),
        },
    );
    let report = expect_success(outcome);

    assert!(report.retried);
    assert_eq!(
        report.output_path,
        Some(dir.path().join("clip_newaudio.mkv"))
    );
    let calls = controller.runner().ffmpeg_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].arg_value("-c:a"), Some("opus"));
    assert_eq!(calls[1].arg_value("-c:a"), Some("aac"));
    assert_eq!(calls[1].arg_value("-b:a"), Some("192k"));
    assert!(events
        .iter()
        .any(|e| matches!(e, ControllerEvent::Retrying { audio_codec } if audio_codec == "aac")));
}

#[test]
fn replace_audio_gives_up_after_one_failed_retry() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("clip.mkv");
    let audio = dir.path().join("voice.wav");
    touch(&source);
    touch(&audio);
    seed_session(&dir, &source, Some("opus"));

    let controller = controller(
        &dir,
        ScriptedRunner::new(|spec| {
            if is_audio_codec_query(spec) {
                Reply::Stdout("pcm_s16le".to_string())
            } else if spec.has_arg("-shortest") {
                let attempt = spec.arg_value("-c:a").unwrap_or_default();
                Reply::Exit(1, format!("first line\nmux failed with {attempt}"))
            } else {
                Reply::Stdout(String::new())
            }
        }),
    );
    let failure = expect_failure(
        run(
            &controller,
            OperationRequest::ReplaceAudio {
                replacement: Some(audio),
            },
        )
        .0,
    );

    assert!(matches!(failure.error, CoreError::ProcessFailed { .. }));
    assert!(failure.reason.ends_with("mux failed with aac"));
    let codecs: Vec<_> = controller
        .runner()
        .ffmpeg_calls()
        .iter()
        .map(|spec| spec.arg_value("-c:a").unwrap_or_default().to_string())
        .collect();
    assert_eq!(codecs, ["opus", "aac"]);
}

#[test]
fn replace_audio_does_not_retry_when_already_aac() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("clip.mkv");
    let audio = dir.path().join("voice.wav");
    touch(&source);
    touch(&audio);
    seed_session(&dir, &source, None);

    let controller = controller(
        &dir,
        ScriptedRunner::new(|spec| {
            if is_audio_codec_query(spec) {
                Reply::Stdout("pcm_s16le".to_string())
            } else {
                Reply::Exit(1, "muxer error".to_string())
            }
        }),
    );
    let failure = expect_failure(
        run(
            &controller,
            OperationRequest::ReplaceAudio {
                replacement: Some(audio),
            },
        )
        .0,
    );
    assert!(matches!(failure.error, CoreError::ProcessFailed { .. }));
    assert_eq!(controller.runner().ffmpeg_calls().len(), 1);
}

#[test]
fn replace_audio_defaults_to_extracted_audio() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("clip.mkv");
    let extracted = dir.path().join("output_audio.wav");
    touch(&source);
    touch(&extracted);
    let mut state = seed_session(&dir, &source, Some("aac"));
    state.extracted_audio_path = Some(extracted.clone());
    SessionStore::new(dir.path().join("state/session.json"))
        .save(&state)
        .unwrap();

    let controller = controller(
        &dir,
        ScriptedRunner::new(|spec| {
            if is_audio_codec_query(spec) {
                Reply::Stdout("pcm_s16le".to_string())
            } else {
                Reply::StderrLines(Vec::new())
            }
        }),
    );
    expect_success(run(&controller, OperationRequest::ReplaceAudio { replacement: None }).0);

    let calls = controller.runner().ffmpeg_calls();
    assert!(calls[0].get_args().iter().any(|a| Path::new(a) == extracted));
}

#[test]
fn replace_audio_without_any_audio_is_invalid_state() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("clip.mkv");
    touch(&source);
    seed_session(&dir, &source, Some("aac"));
    let controller = controller(&dir, ScriptedRunner::new(|_| panic!("no process expected")));

    let failure =
        expect_failure(run(&controller, OperationRequest::ReplaceAudio { replacement: None }).0);
    assert!(matches!(failure.error, CoreError::InvalidState(_)));
}

#[test]
fn replacement_without_audio_stream_is_rejected() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("clip.mkv");
    let silent = dir.path().join("silent.mp4");
    touch(&source);
    touch(&silent);
    seed_session(&dir, &source, Some("aac"));

    let controller = controller(&dir, ScriptedRunner::new(|_| Reply::Stdout(String::new())));
    let failure = expect_failure(
        run(
            &controller,
            OperationRequest::ReplaceAudio {
                replacement: Some(silent),
            },
        )
        .0,
    );
    assert!(matches!(failure.error, CoreError::PreconditionFailed(_)));
    assert!(controller.runner().ffmpeg_calls().is_empty());
}

#[test]
fn transcode_detects_encoder_once() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("clip.mkv");
    touch(&input);
    let controller = controller(
        &dir,
        ScriptedRunner::new(|spec| {
            if is_encoder_query(spec) {
                Reply::Stdout(" V....D h264_nvenc   NVIDIA NVENC H.264 encoder\n".to_string())
            } else {
                Reply::StderrLines(vec![
                    "frame=  120 fps= 60 q=23.0 size=    512kB time=00:00:04.00 bitrate=1048.6kbits/s speed=2.0x".to_string(),
                ])
            }
        }),
    );

    for _ in 0..2 {
        let report = expect_success(
            run(
                &controller,
                OperationRequest::TranscodeForUpload {
                    input: input.clone(),
                    output: None,
                },
            )
            .0,
        );
        assert_eq!(report.output_path, Some(dir.path().join("clip_converted.mp4")));
    }

    let calls = controller.runner().calls();
    assert_eq!(calls.iter().filter(|c| is_encoder_query(c)).count(), 1);
    let encodes: Vec<_> = calls.iter().filter(|c| c.has_arg("-stats")).collect();
    assert_eq!(encodes.len(), 2);
    assert_eq!(encodes[0].arg_value("-c:v"), Some("h264_nvenc"));
}

#[test]
fn transcode_onto_its_input_is_rejected() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("clip.mp4");
    touch(&input);
    let controller = controller(&dir, ScriptedRunner::new(|_| panic!("no process expected")));

    let failure = expect_failure(
        run(
            &controller,
            OperationRequest::TranscodeForUpload {
                input: input.clone(),
                output: Some(input),
            },
        )
        .0,
    );
    assert!(matches!(failure.error, CoreError::PreconditionFailed(_)));
}

#[test]
fn missing_ffmpeg_is_reported_as_not_found() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("clip.mp4");
    touch(&input);
    let controller = controller(&dir, ScriptedRunner::new(|_| Reply::NotFound));

    let failure = expect_failure(
        run(
            &controller,
            OperationRequest::CompressAudio {
                input,
                output: None,
            },
        )
        .0,
    );
    assert!(matches!(failure.error, CoreError::ExecutableNotFound(_)));
}

#[test]
fn upscale_warns_when_target_is_not_larger() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("clip.mp4");
    touch(&input);
    let controller = controller(
        &dir,
        ScriptedRunner::new(|spec| {
            if is_json_probe(spec) {
                Reply::Stdout(probe_json("h264", Some("aac"), "mov,mp4", (1920, 1080), "30/1"))
            } else if is_encoder_query(spec) {
                Reply::Stdout(String::new())
            } else {
                Reply::StderrLines(Vec::new())
            }
        }),
    );

    let report = expect_success(
        run(
            &controller,
            OperationRequest::Upscale {
                input,
                output: None,
                resolution: ResolutionPreset::P720,
                frame_rate: FrameRatePreset::Fps60,
            },
        )
        .0,
    );
    assert_eq!(report.warnings.len(), 1);
    let encode = controller.runner().ffmpeg_calls().pop().unwrap();
    assert!(!encode.has_arg("-vf"));
    assert_eq!(encode.arg_value("-r"), Some("60"));
    assert_eq!(encode.arg_value("-c:v"), Some("libx264"));
    assert_eq!(
        report.output_path,
        Some(dir.path().join("clip_upscaled_720p_60fps.mp4"))
    );
}

#[test]
fn upscale_that_would_change_nothing_is_rejected() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("clip.mp4");
    touch(&input);
    let controller = controller(
        &dir,
        ScriptedRunner::new(|spec| {
            if is_json_probe(spec) {
                Reply::Stdout(probe_json("h264", Some("aac"), "mov,mp4", (1080, 1920), "30/1"))
            } else {
                Reply::StderrLines(Vec::new())
            }
        }),
    );

    let failure = expect_failure(
        run(
            &controller,
            OperationRequest::Upscale {
                input,
                output: None,
                resolution: ResolutionPreset::P1440,
                frame_rate: FrameRatePreset::Fps30,
            },
        )
        .0,
    );
    assert!(matches!(failure.error, CoreError::PreconditionFailed(_)));
    assert!(failure.reason.starts_with("Nothing to do"));
    assert_eq!(failure.warnings.len(), 2);
    assert!(controller.runner().ffmpeg_calls().is_empty());
}

#[test]
fn compress_audio_runs_three_steps_in_a_scratch_directory() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("clip.mp4");
    touch(&input);
    let controller = controller(&dir, ScriptedRunner::new(|_| Reply::StderrLines(Vec::new())));

    let (outcome, events) = run(
        &controller,
        OperationRequest::CompressAudio {
            input: input.clone(),
            output: None,
        },
    );
    let report = expect_success(outcome);
    assert_eq!(report.output_path, Some(dir.path().join("clip_mp3.mp4")));

    let steps: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ControllerEvent::Step { index, total, .. } => Some((*index, *total)),
            _ => None,
        })
        .collect();
    assert_eq!(steps, [(1, 3), (2, 3), (3, 3)]);

    let calls = controller.runner().ffmpeg_calls();
    assert_eq!(calls.len(), 3);
    let wav = PathBuf::from(calls[0].output_path().unwrap());
    let mp3 = PathBuf::from(calls[1].output_path().unwrap());
    assert_eq!(calls[1].arg_value("-i"), wav.to_str());
    assert!(calls[2].get_args().iter().any(|a| Path::new(a) == mp3));
    // Scratch directory is gone once the operation returns.
    assert!(!wav.parent().unwrap().exists());
}

#[test]
fn worker_delivers_outcome_to_the_foreground() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("clip.mp4");
    touch(&input);
    let controller = Arc::new(controller(
        &dir,
        ScriptedRunner::new(|_| Reply::StderrLines(vec!["working".to_string()])),
    ));

    let handle = OperationWorker::spawn(
        Arc::clone(&controller),
        OperationRequest::CompressAudio {
            input,
            output: None,
        },
    )
    .unwrap();
    let mut lines = 0;
    let outcome = handle
        .wait(|event| {
            if matches!(event, ControllerEvent::Output(_)) {
                lines += 1;
            }
        })
        .unwrap();

    assert!(outcome.is_success());
    assert_eq!(lines, 3);
    assert_eq!(controller.runner().calls().len(), 3);
}
