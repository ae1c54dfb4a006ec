// ffdeck-cli/src/commands/video.rs
//
// Video re-encodes. Both report the selected encoder before starting so the
// user knows whether the GPU path is in use.

use ffdeck_core::{OperationKind, OperationRequest, ProcessRunner};

use super::CommandContext;
use crate::cli::{TranscodeArgs, UpscaleArgs};
use crate::error::CliResult;
use crate::terminal;

fn announce_encoder<R: ProcessRunner + 'static>(
    ctx: &CommandContext<R>,
    kind: OperationKind,
) -> CliResult<()> {
    ctx.ensure_can_start(kind)?;
    let encoder = ctx.controller.encoder_capability();
    terminal::print_status("Encoder", &encoder.to_string());
    Ok(())
}

pub fn run_transcode<R: ProcessRunner + 'static>(
    ctx: &mut CommandContext<R>,
    args: TranscodeArgs,
) -> CliResult<()> {
    announce_encoder(ctx, OperationKind::TranscodeForUpload)?;
    ctx.run(OperationRequest::TranscodeForUpload {
        input: args.input,
        output: args.output,
    })?;
    Ok(())
}

pub fn run_upscale<R: ProcessRunner + 'static>(
    ctx: &mut CommandContext<R>,
    args: UpscaleArgs,
) -> CliResult<()> {
    announce_encoder(ctx, OperationKind::Upscale)?;
    terminal::print_status("Target", &format!("{} / {}", args.resolution, args.fps));
    ctx.run(OperationRequest::Upscale {
        input: args.input,
        output: args.output,
        resolution: args.resolution,
        frame_rate: args.fps,
    })?;
    Ok(())
}
