/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use super::{ITEM_HEADER_LENGTH, MESSAGE_HEADER_LENGTH, MESSAGE_PAYLOAD_MAX_LENGTH};

pub(crate) const ITEM_OPCODE: u8 = 0x10;
pub(crate) const ITEM_USERNAME: u8 = 0x21;
pub(crate) const ITEM_PASSWORD: u8 = 0x22;
pub(crate) const ITEM_NAME: u8 = 0x23;
pub(crate) const ITEM_SERVICE: u8 = 0x24;
pub(crate) const ITEM_TOKEN: u8 = 0x41;
pub(crate) const ITEM_MESSAGE: u8 = 0x42;
pub(crate) const ITEM_STATUS: u8 = 0x43;
pub(crate) const ITEM_ERROR: u8 = 0x4F;

pub(crate) fn push_item(buf: &mut Vec<u8>, tag: u8, data: &[u8]) {
    debug_assert!(data.len() <= u16::MAX as usize);
    buf.push(tag);
    buf.push(((data.len() >> 8) & 0xFF) as u8);
    buf.push((data.len() & 0xFF) as u8);
    buf.extend_from_slice(data);
}

pub(crate) fn push_byte_item(buf: &mut Vec<u8>, tag: u8, value: u8) {
    push_item(buf, tag, &[value]);
}

/// Split a message payload into (tag, data) items. Returns `None` if an item
/// header or item data runs past the end of the payload.
pub(crate) fn split_items(payload: &[u8]) -> Option<Vec<(u8, &[u8])>> {
    let mut items = Vec::with_capacity(3);
    let mut offset = 0usize;
    while offset < payload.len() {
        if payload.len() - offset < ITEM_HEADER_LENGTH {
            return None;
        }
        let tag = payload[offset];
        let len = u16::from_be_bytes([payload[offset + 1], payload[offset + 2]]) as usize;
        offset += ITEM_HEADER_LENGTH;
        if payload.len() - offset < len {
            return None;
        }
        items.push((tag, &payload[offset..offset + len]));
        offset += len;
    }
    Some(items)
}

/// Start a message buffer with a zeroed header. Items are appended after.
pub(crate) fn new_message_buf() -> Vec<u8> {
    vec![0u8; MESSAGE_HEADER_LENGTH]
}

/// Fill in the header of a message buffer created by [`new_message_buf`].
/// Fails when the appended items exceed the payload limit.
pub(crate) fn seal_message(buf: &mut Vec<u8>, id: u32) -> Result<(), usize> {
    let payload_len = buf.len() - MESSAGE_HEADER_LENGTH;
    if payload_len > MESSAGE_PAYLOAD_MAX_LENGTH {
        return Err(payload_len);
    }
    buf[0] = super::PROTOCOL_VERSION;
    buf[1] = 0x00;
    buf[2] = ((payload_len >> 8) & 0xFF) as u8;
    buf[3] = (payload_len & 0xFF) as u8;
    buf[4..8].copy_from_slice(&id.to_be_bytes());
    Ok(())
}
