//! Store operations over an `async-imap` session.

use futures_util::StreamExt as _;

use crate::{Flag, Message, Outlet, SourceStore, TargetStore, UidSet};

const FETCH_QUERY: &str = "(UID FLAGS INTERNALDATE BODY[])";

/// Errors of the IMAP store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The server failed the command.
    #[error("IMAP error: {0}")]
    Imap(#[from] async_imap::error::Error),

    /// A fetched message came without a UID.
    #[error("message {seq} has no UID")]
    MissingUid {
        /// Sequence number of the message.
        seq: u32,
    },

    /// A fetched message came without content.
    #[error("message {uid} has no body")]
    MissingBody {
        /// UID of the message.
        uid: u32,
    },
}

impl<'a> From<&async_imap::types::Flag<'a>> for Flag {
    fn from(flag: &async_imap::types::Flag<'a>) -> Self {
        use async_imap::types::Flag as Imap;

        match flag {
            Imap::Seen => Flag::Seen,
            Imap::Answered => Flag::Answered,
            Imap::Flagged => Flag::Flagged,
            Imap::Deleted => Flag::Deleted,
            Imap::Draft => Flag::Draft,
            Imap::Recent => Flag::Recent,
            Imap::MayCreate => Flag::Keyword("\\*".to_owned()),
            Imap::Custom(keyword) => Flag::Keyword(keyword.to_string()),
            #[allow(unreachable_patterns)]
            other => Flag::Keyword(format!("{other:?}")),
        }
    }
}

impl TryFrom<&async_imap::types::Fetch> for Message {
    type Error = Error;

    fn try_from(fetch: &async_imap::types::Fetch) -> Result<Self, Self::Error> {
        let uid = fetch.uid.ok_or(Error::MissingUid { seq: fetch.message })?;
        let body = fetch.body().ok_or(Error::MissingBody { uid })?;

        Ok(Message {
            uid,
            flags: fetch.flags().map(|flag| Flag::from(&flag)).collect(),
            internal_date: fetch.internal_date(),
            body: body.to_vec(),
        })
    }
}

impl<S> SourceStore for async_imap::Session<S>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + std::fmt::Debug,
{
    type Error = Error;

    async fn examine(&mut self, mailbox: &str) -> Result<u32, Self::Error> {
        let mailbox = async_imap::Session::examine(self, mailbox).await?;
        Ok(mailbox.exists)
    }

    async fn fetch_all(&mut self, count: u32, outlet: &mut Outlet) -> Result<(), Self::Error> {
        let stream = self.fetch(format!("1:{count}"), FETCH_QUERY).await?;
        let mut stream = std::pin::pin!(stream);

        let mut invalid = None;
        while let Some(fetch) = stream.next().await {
            let fetch = fetch?;
            if invalid.is_some() || !outlet.is_open() {
                continue;
            }

            match Message::try_from(&fetch) {
                Ok(message) => {
                    tracing::debug!(uid = message.uid, size = message.body.len(), "fetched message");
                    outlet.push(message).await;
                }
                Err(err) => invalid = Some(err),
            }
        }

        match invalid {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn select(&mut self, mailbox: &str) -> Result<(), Self::Error> {
        async_imap::Session::select(self, mailbox).await?;
        Ok(())
    }

    async fn mark_deleted(&mut self, uids: &UidSet) -> Result<(), Self::Error> {
        let stream = self
            .uid_store(uids.to_string(), "+FLAGS (\\Deleted)")
            .await?;
        let mut stream = std::pin::pin!(stream);

        while let Some(update) = stream.next().await {
            update?;
        }

        Ok(())
    }
}

impl<S> TargetStore for async_imap::Session<S>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + std::fmt::Debug,
{
    type Error = Error;

    async fn select(&mut self, mailbox: &str) -> Result<(), Self::Error> {
        async_imap::Session::select(self, mailbox).await?;
        Ok(())
    }

    async fn append(&mut self, mailbox: &str, message: &Message) -> Result<(), Self::Error> {
        let flags = message.imap_flags();
        let internal_date = message.imap_internal_date();

        async_imap::Session::append(
            self,
            mailbox,
            flags.as_deref(),
            internal_date.as_deref(),
            &message.body,
        )
        .await?;

        Ok(())
    }
}
