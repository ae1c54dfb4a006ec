// ffdeck-cli/src/commands/audio.rs
//
// Audio operations: extract the source's audio, replace it, or re-encode a
// video's audio track to MP3.

use ffdeck_core::{OperationRequest, ProcessRunner};

use super::CommandContext;
use crate::cli::{CompressAudioArgs, ReplaceAudioArgs};
use crate::error::CliResult;
use crate::terminal;

pub fn run_extract_audio<R: ProcessRunner + 'static>(ctx: &mut CommandContext<R>) -> CliResult<()> {
    ctx.run(OperationRequest::ExtractAudio)?;
    Ok(())
}

pub fn run_replace_audio<R: ProcessRunner + 'static>(
    ctx: &mut CommandContext<R>,
    args: ReplaceAudioArgs,
) -> CliResult<()> {
    let report = ctx.run(OperationRequest::ReplaceAudio {
        replacement: args.audio,
    })?;
    if report.retried {
        terminal::print_warning("The source's audio codec was rejected; the new track was encoded as AAC");
    }
    Ok(())
}

pub fn run_compress_audio<R: ProcessRunner + 'static>(
    ctx: &mut CommandContext<R>,
    args: CompressAudioArgs,
) -> CliResult<()> {
    ctx.run(OperationRequest::CompressAudio {
        input: args.input,
        output: args.output,
    })?;
    Ok(())
}
