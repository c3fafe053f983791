/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::item::{
    ITEM_NAME, ITEM_OPCODE, ITEM_PASSWORD, ITEM_SERVICE, ITEM_USERNAME, new_message_buf,
    push_byte_item, push_item, seal_message, split_items,
};
use super::{MESSAGE_HEADER_LENGTH, MESSAGE_PAYLOAD_MAX_LENGTH, PROTOCOL_VERSION};

#[derive(Debug, Error)]
pub enum HelloRequestError {
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
    #[error("no opcode set")]
    NoOpCodeSet,
    #[error("invalid opcode {0:#04x}")]
    InvalidOpCode(u8),
    #[error("no {0} item set")]
    MissingItem(&'static str),
    #[error("invalid text value in {0} item")]
    InvalidTextValue(&'static str),
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HelloOp {
    Login = 0x01,
    Say = 0x02,
    Check = 0x03,
}

impl HelloOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            HelloOp::Login => "login",
            HelloOp::Say => "say",
            HelloOp::Check => "check",
        }
    }
}

impl TryFrom<u8> for HelloOp {
    type Error = HelloRequestError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(HelloOp::Login),
            0x02 => Ok(HelloOp::Say),
            0x03 => Ok(HelloOp::Check),
            n => Err(HelloRequestError::InvalidOpCode(n)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelloRequestPayload {
    Login { username: String, password: String },
    Say { name: String },
    Check { service: String },
}

/// A length-checked message frame whose payload has not been parsed yet.
///
/// Header level failures leave the stream in an unknown state and should
/// close the connection; item level failures keep the frame boundary intact
/// and can be answered with an error response carrying the frame id.
#[derive(Debug, Clone)]
pub struct HelloFrame {
    pub id: u32,
    pub payload: Vec<u8>,
}

impl HelloFrame {
    pub async fn recv<R>(reader: &mut R) -> Result<Self, HelloRequestError>
    where
        R: AsyncRead + Unpin,
    {
        let mut header = [0u8; MESSAGE_HEADER_LENGTH];
        reader.read_exact(&mut header).await.map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                HelloRequestError::ClosedByPeer
            } else {
                HelloRequestError::ReadFailed(e)
            }
        })?;
        if header[0] != PROTOCOL_VERSION {
            return Err(HelloRequestError::UnsupportedVersion(header[0]));
        }
        let len = u16::from_be_bytes([header[2], header[3]]) as usize;
        if len > MESSAGE_PAYLOAD_MAX_LENGTH {
            return Err(HelloRequestError::OversizedPayload(len));
        }
        let id = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);

        let mut payload = vec![0u8; len];
        reader
            .read_exact(&mut payload)
            .await
            .map_err(HelloRequestError::ReadFailed)?;

        Ok(HelloFrame { id, payload })
    }

    pub fn parse(&self) -> Result<HelloRequest, HelloRequestError> {
        HelloRequest::parse(self.id, &self.payload)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelloRequest {
    pub id: u32,
    pub payload: HelloRequestPayload,
}

impl HelloRequest {
    pub fn login(id: u32, username: impl Into<String>, password: impl Into<String>) -> Self {
        HelloRequest {
            id,
            payload: HelloRequestPayload::Login {
                username: username.into(),
                password: password.into(),
            },
        }
    }

    pub fn say(id: u32, name: impl Into<String>) -> Self {
        HelloRequest {
            id,
            payload: HelloRequestPayload::Say { name: name.into() },
        }
    }

    pub fn check(id: u32, service: impl Into<String>) -> Self {
        HelloRequest {
            id,
            payload: HelloRequestPayload::Check {
                service: service.into(),
            },
        }
    }

    pub fn op(&self) -> HelloOp {
        match &self.payload {
            HelloRequestPayload::Login { .. } => HelloOp::Login,
            HelloRequestPayload::Say { .. } => HelloOp::Say,
            HelloRequestPayload::Check { .. } => HelloOp::Check,
        }
    }

    pub async fn recv<R>(reader: &mut R) -> Result<Self, HelloRequestError>
    where
        R: AsyncRead + Unpin,
    {
        let frame = HelloFrame::recv(reader).await?;
        frame.parse()
    }

    pub fn parse(id: u32, payload: &[u8]) -> Result<Self, HelloRequestError> {
        let items = split_items(payload).ok_or(HelloRequestError::InvalidItemEncoding)?;

        let mut opcode: Option<u8> = None;
        let mut username: Option<&[u8]> = None;
        let mut password: Option<&[u8]> = None;
        let mut name: Option<&[u8]> = None;
        let mut service: Option<&[u8]> = None;

        for (tag, data) in items {
            match tag {
                ITEM_OPCODE => {
                    if data.len() != 1 {
                        return Err(HelloRequestError::InvalidItemEncoding);
                    }
                    opcode = Some(data[0]);
                }
                ITEM_USERNAME => username = Some(data),
                ITEM_PASSWORD => password = Some(data),
                ITEM_NAME => name = Some(data),
                ITEM_SERVICE => service = Some(data),
                _ => {} // unknown items are skipped
            }
        }

        let opcode = opcode.ok_or(HelloRequestError::NoOpCodeSet)?;
        let payload = match HelloOp::try_from(opcode)? {
            HelloOp::Login => HelloRequestPayload::Login {
                username: text_item(username, "username")?,
                password: text_item(password, "password")?,
            },
            HelloOp::Say => HelloRequestPayload::Say {
                name: text_item(name, "name")?,
            },
            HelloOp::Check => HelloRequestPayload::Check {
                service: text_item(service, "service")?,
            },
        };
        Ok(HelloRequest { id, payload })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, HelloRequestError> {
        let mut buf = new_message_buf();
        push_byte_item(&mut buf, ITEM_OPCODE, self.op() as u8);
        match &self.payload {
            HelloRequestPayload::Login { username, password } => {
                push_item(&mut buf, ITEM_USERNAME, username.as_bytes());
                push_item(&mut buf, ITEM_PASSWORD, password.as_bytes());
            }
            HelloRequestPayload::Say { name } => {
                push_item(&mut buf, ITEM_NAME, name.as_bytes());
            }
            HelloRequestPayload::Check { service } => {
                push_item(&mut buf, ITEM_SERVICE, service.as_bytes());
            }
        }
        seal_message(&mut buf, self.id).map_err(HelloRequestError::OversizedPayload)?;
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

fn text_item(data: Option<&[u8]>, what: &'static str) -> Result<String, HelloRequestError> {
    let data = data.ok_or(HelloRequestError::MissingItem(what))?;
    String::from_utf8(data.to_vec()).map_err(|_| HelloRequestError::InvalidTextValue(what))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_round_trip() {
        let req = HelloRequest::login(7, "kelseyhightower", "password");
        let buf = req.to_bytes().unwrap();
        assert_eq!(buf[0], PROTOCOL_VERSION);
        assert_eq!(&buf[4..8], &7u32.to_be_bytes());

        let parsed = HelloRequest::parse(7, &buf[MESSAGE_HEADER_LENGTH..]).unwrap();
        assert_eq!(parsed, req);
        assert_eq!(parsed.op(), HelloOp::Login);
    }

    #[test]
    fn say_empty_name() {
        let req = HelloRequest::say(1, "");
        let buf = req.to_bytes().unwrap();
        let parsed = HelloRequest::parse(1, &buf[MESSAGE_HEADER_LENGTH..]).unwrap();
        assert_eq!(
            parsed.payload,
            HelloRequestPayload::Say {
                name: String::new()
            }
        );
    }

    #[test]
    fn missing_opcode() {
        let mut payload = Vec::new();
        push_item(&mut payload, ITEM_NAME, b"x");
        let err = HelloRequest::parse(1, &payload).unwrap_err();
        assert!(matches!(err, HelloRequestError::NoOpCodeSet));
    }

    #[test]
    fn unknown_opcode() {
        let mut payload = Vec::new();
        push_byte_item(&mut payload, ITEM_OPCODE, 0x7F);
        let err = HelloRequest::parse(1, &payload).unwrap_err();
        assert!(matches!(err, HelloRequestError::InvalidOpCode(0x7F)));
    }

    #[test]
    fn truncated_item() {
        // item header declares 4 bytes of data but only 1 follows
        let payload = [ITEM_OPCODE, 0x00, 0x04, 0x01];
        let err = HelloRequest::parse(1, &payload).unwrap_err();
        assert!(matches!(err, HelloRequestError::InvalidItemEncoding));
    }

    #[test]
    fn check_missing_service_item() {
        let mut payload = Vec::new();
        push_byte_item(&mut payload, ITEM_OPCODE, HelloOp::Check as u8);
        let err = HelloRequest::parse(1, &payload).unwrap_err();
        assert!(matches!(err, HelloRequestError::MissingItem("service")));
    }

    #[tokio::test]
    async fn recv_over_stream() {
        let (mut client, mut server) = tokio::io::duplex(1024);

        let req = HelloRequest::check(3, "grpc.health.v1.helloservice");
        req.send(&mut client).await.unwrap();

        let parsed = HelloRequest::recv(&mut server).await.unwrap();
        assert_eq!(parsed, req);
    }

    #[tokio::test]
    async fn recv_closed() {
        let (client, mut server) = tokio::io::duplex(64);
        drop(client);
        let err = HelloRequest::recv(&mut server).await.unwrap_err();
        assert!(matches!(err, HelloRequestError::ClosedByPeer));
    }
}
