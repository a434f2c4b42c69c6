use std::io::{self, Write};
use std::sync::Arc;

use sonar_chat::{ChatProvider, ChatStreamProxy, Conversation};
use sonar_core::Credentials;

use crate::cli::ChatArgs;
use crate::error::CliError;
use crate::output;

pub async fn run(args: &ChatArgs, credentials: &Credentials) -> Result<(), CliError> {
    let proxy = ChatStreamProxy::from_credentials(args.provider, credentials);
    let content = args.message.join(" ");
    converse(Arc::new(proxy), content, &mut io::stdout()).await?;
    println!();
    Ok(())
}

/// Run one turn, writing each chunk to `out` as it arrives.
pub async fn converse(
    provider: Arc<dyn ChatProvider>,
    content: String,
    out: &mut impl Write,
) -> Result<Conversation, CliError> {
    let mut conversation = Conversation::new(provider);
    let mut write_error = None;

    let result = conversation
        .submit_with(content, |chunk| {
            if write_error.is_none() {
                write_error = output::write_chunk(&mut *out, chunk).err();
            }
        })
        .await;

    result?;
    match write_error {
        Some(error) => Err(error.into()),
        None => Ok(conversation),
    }
}
