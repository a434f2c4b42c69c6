use std::path::Path;

use serde_json::json;
use sonar_chat::{AudioPayload, AudioTranscription, Transcriber};
use sonar_core::Credentials;

use crate::cli::TranscribeArgs;
use crate::error::CliError;
use crate::output;

pub async fn run(args: &TranscribeArgs, credentials: &Credentials, pretty: bool) -> Result<(), CliError> {
    let audio = load_audio(&args.file)?;
    log::debug!("uploading {} ({} bytes)", audio.file_name, audio.bytes.len());
    let text = Transcriber::from_credentials(credentials)
        .transcribe(Some(audio))
        .await?;
    output::render(&json!({ "text": text }), pretty)
}

pub fn load_audio(path: &Path) -> Result<AudioPayload, CliError> {
    let bytes = std::fs::read(path)?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("audio.webm")
        .to_owned();
    Ok(AudioPayload::new(file_name, content_type_for(path), bytes))
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("webm") => "audio/webm",
        Some("mp3" | "mpga" | "mpeg") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("m4a" | "mp4") => "audio/mp4",
        Some("ogg" | "oga") => "audio/ogg",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}
