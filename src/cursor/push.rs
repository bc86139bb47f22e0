use crate::model::{Range, ReductionNode};

const OP_0: u8 = 0x00;
const OP_PUSHDATA1: u8 = 0x4c;
const OP_PUSHDATA2: u8 = 0x4d;
const OP_PUSHDATA4: u8 = 0x4e;
const OP_1NEGATE: u8 = 0x4f;
const OP_1: u8 = 0x51;
const MAX_DIRECT_PUSH: usize = 75;

/// Encodes `data` as the smallest instruction that pushes it.
pub fn encode_data_push(data: &[u8]) -> Vec<u8> {
    match data {
        [] => vec![OP_0],
        [value @ 1..=16] => vec![OP_1 + value - 1],
        [0x81] => vec![OP_1NEGATE],
        _ => {
            let length = data.len();
            let mut encoded = Vec::with_capacity(length + 5);
            if length <= MAX_DIRECT_PUSH {
                encoded.push(length as u8);
            } else if length <= u8::MAX as usize {
                encoded.push(OP_PUSHDATA1);
                encoded.push(length as u8);
            } else if length <= u16::MAX as usize {
                encoded.push(OP_PUSHDATA2);
                encoded.extend_from_slice(&(length as u16).to_le_bytes());
            } else {
                encoded.push(OP_PUSHDATA4);
                encoded.extend_from_slice(&(length as u32).to_le_bytes());
            }
            encoded.extend_from_slice(data);
            encoded
        }
    }
}

/// Presents `node` as if its bytecode had been pushed as data, so a pushed
/// tested script is sampled inside a push statement while its own segments
/// keep their line and column numbers.
pub fn wrap_in_push(node: &ReductionNode) -> ReductionNode {
    let bytecode = encode_data_push(&node.bytecode);
    let range = Range::new(0, 0, node.range.end_line, node.range.end_column);
    let pushed = ReductionNode {
        bytecode: node.bytecode.clone(),
        range: node.range,
        script: node.script.clone(),
        push: None,
        source: None,
    };
    ReductionNode {
        bytecode: bytecode.clone(),
        range,
        script: Some(vec![ReductionNode {
            bytecode,
            range,
            script: None,
            push: Some(Box::new(pushed)),
            source: None,
        }]),
        push: None,
        source: None,
    }
}
