/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::fmt;
use std::io;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::ServingStatus;
use super::item::{
    ITEM_ERROR, ITEM_MESSAGE, ITEM_STATUS, ITEM_TOKEN, new_message_buf, push_byte_item, push_item,
    seal_message, split_items,
};
use super::{MESSAGE_HEADER_LENGTH, MESSAGE_PAYLOAD_MAX_LENGTH, PROTOCOL_VERSION};

#[derive(Debug, Error)]
pub enum HelloResponseError {
    #[error("read failed: {0:?}")]
    ReadFailed(io::Error),
    #[error("connection closed by peer")]
    ClosedByPeer,
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(u8),
    #[error("oversized payload length {0}")]
    OversizedPayload(usize),
    #[error("invalid item encoding")]
    InvalidItemEncoding,
    #[error("no response item set")]
    NoResponseItemSet,
    #[error("invalid status value {0}")]
    InvalidStatusValue(u8),
    #[error("invalid error code {0:#04x}")]
    InvalidErrorCode(u8),
    #[error("invalid text value in {0} item")]
    InvalidTextValue(&'static str),
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HelloErrorCode {
    BadRequest = 0x01,
    AuthFailed = 0x02,
    NotFound = 0x03,
    Internal = 0x08,
}

impl TryFrom<u8> for HelloErrorCode {
    type Error = HelloResponseError;

    fn try_from(value: u8) -> Result<Self, HelloResponseError> {
        match value {
            0x01 => Ok(HelloErrorCode::BadRequest),
            0x02 => Ok(HelloErrorCode::AuthFailed),
            0x03 => Ok(HelloErrorCode::NotFound),
            0x08 => Ok(HelloErrorCode::Internal),
            n => Err(HelloResponseError::InvalidErrorCode(n)),
        }
    }
}

impl fmt::Display for HelloErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HelloErrorCode::BadRequest => f.write_str("bad request"),
            HelloErrorCode::AuthFailed => f.write_str("authentication failed"),
            HelloErrorCode::NotFound => f.write_str("not found"),
            HelloErrorCode::Internal => f.write_str("internal error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelloResponsePayload {
    Token(String),
    Message(String),
    Status(ServingStatus),
    Error(HelloErrorCode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelloResponse {
    pub id: u32,
    pub payload: HelloResponsePayload,
}

impl HelloResponse {
    pub fn token(id: u32, token: impl Into<String>) -> Self {
        HelloResponse {
            id,
            payload: HelloResponsePayload::Token(token.into()),
        }
    }

    pub fn message(id: u32, message: impl Into<String>) -> Self {
        HelloResponse {
            id,
            payload: HelloResponsePayload::Message(message.into()),
        }
    }

    pub fn status(id: u32, status: ServingStatus) -> Self {
        HelloResponse {
            id,
            payload: HelloResponsePayload::Status(status),
        }
    }

    pub fn error(id: u32, code: HelloErrorCode) -> Self {
        HelloResponse {
            id,
            payload: HelloResponsePayload::Error(code),
        }
    }

    pub fn error_code(&self) -> Option<HelloErrorCode> {
        match &self.payload {
            HelloResponsePayload::Error(code) => Some(*code),
            _ => None,
        }
    }

    pub async fn recv<R>(reader: &mut R) -> Result<Self, HelloResponseError>
    where
        R: AsyncRead + Unpin,
    {
        let mut header = [0u8; MESSAGE_HEADER_LENGTH];
        reader.read_exact(&mut header).await.map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                HelloResponseError::ClosedByPeer
            } else {
                HelloResponseError::ReadFailed(e)
            }
        })?;
        if header[0] != PROTOCOL_VERSION {
            return Err(HelloResponseError::UnsupportedVersion(header[0]));
        }
        let len = u16::from_be_bytes([header[2], header[3]]) as usize;
        if len > MESSAGE_PAYLOAD_MAX_LENGTH {
            return Err(HelloResponseError::OversizedPayload(len));
        }
        let id = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);

        let mut payload = vec![0u8; len];
        reader
            .read_exact(&mut payload)
            .await
            .map_err(HelloResponseError::ReadFailed)?;

        Self::parse(id, &payload)
    }

    pub fn parse(id: u32, payload: &[u8]) -> Result<Self, HelloResponseError> {
        let items = split_items(payload).ok_or(HelloResponseError::InvalidItemEncoding)?;

        let mut parsed: Option<HelloResponsePayload> = None;
        for (tag, data) in items {
            match tag {
                ITEM_ERROR => {
                    if data.len() != 1 {
                        return Err(HelloResponseError::InvalidItemEncoding);
                    }
                    // an error item always wins over any data item
                    return Ok(HelloResponse {
                        id,
                        payload: HelloResponsePayload::Error(HelloErrorCode::try_from(data[0])?),
                    });
                }
                ITEM_TOKEN => {
                    parsed = Some(HelloResponsePayload::Token(text_item(data, "token")?));
                }
                ITEM_MESSAGE => {
                    parsed = Some(HelloResponsePayload::Message(text_item(data, "message")?));
                }
                ITEM_STATUS => {
                    if data.len() != 1 {
                        return Err(HelloResponseError::InvalidItemEncoding);
                    }
                    let status = ServingStatus::try_from(data[0])
                        .map_err(HelloResponseError::InvalidStatusValue)?;
                    parsed = Some(HelloResponsePayload::Status(status));
                }
                _ => {}
            }
        }

        let payload = parsed.ok_or(HelloResponseError::NoResponseItemSet)?;
        Ok(HelloResponse { id, payload })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, HelloResponseError> {
        let mut buf = new_message_buf();
        match &self.payload {
            HelloResponsePayload::Token(token) => push_item(&mut buf, ITEM_TOKEN, token.as_bytes()),
            HelloResponsePayload::Message(message) => {
                push_item(&mut buf, ITEM_MESSAGE, message.as_bytes())
            }
            HelloResponsePayload::Status(status) => {
                push_byte_item(&mut buf, ITEM_STATUS, status.as_u8())
            }
            HelloResponsePayload::Error(code) => push_byte_item(&mut buf, ITEM_ERROR, *code as u8),
        }
        seal_message(&mut buf, self.id).map_err(HelloResponseError::OversizedPayload)?;
        Ok(buf)
    }

    pub async fn send<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let buf = self
            .to_bytes()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        writer.write_all(&buf).await?;
        writer.flush().await
    }
}

fn text_item(data: &[u8], what: &'static str) -> Result<String, HelloResponseError> {
    String::from_utf8(data.to_vec()).map_err(|_| HelloResponseError::InvalidTextValue(what))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let rsp = HelloResponse::token(9, "c0ffee");
        let buf = rsp.to_bytes().unwrap();
        let parsed = HelloResponse::parse(9, &buf[MESSAGE_HEADER_LENGTH..]).unwrap();
        assert_eq!(parsed, rsp);
        assert!(parsed.error_code().is_none());
    }

    #[test]
    fn status_round_trip() {
        let rsp = HelloResponse::status(2, ServingStatus::Serving);
        let buf = rsp.to_bytes().unwrap();
        let parsed = HelloResponse::parse(2, &buf[MESSAGE_HEADER_LENGTH..]).unwrap();
        assert_eq!(
            parsed.payload,
            HelloResponsePayload::Status(ServingStatus::Serving)
        );
    }

    #[test]
    fn error_wins_over_data() {
        let mut payload = Vec::new();
        push_byte_item(&mut payload, ITEM_ERROR, HelloErrorCode::NotFound as u8);
        push_item(&mut payload, ITEM_MESSAGE, b"ignored");
        let parsed = HelloResponse::parse(4, &payload).unwrap();
        assert_eq!(parsed.error_code(), Some(HelloErrorCode::NotFound));
    }

    #[test]
    fn empty_payload() {
        let err = HelloResponse::parse(1, &[]).unwrap_err();
        assert!(matches!(err, HelloResponseError::NoResponseItemSet));
    }

    #[test]
    fn invalid_status_value() {
        let mut payload = Vec::new();
        push_byte_item(&mut payload, ITEM_STATUS, 9);
        let err = HelloResponse::parse(1, &payload).unwrap_err();
        assert!(matches!(err, HelloResponseError::InvalidStatusValue(9)));
    }
}
