use serde::Serialize;

use crate::resolver::ResolvedField;

/// One step of a method's field codec. Decode and encode both walk the same
/// step list, so byte boundaries and bit positions cannot drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CodecStep {
    /// Start a new backing byte. Decode reads it here; encode zeroes it.
    OpenBitset { bitset: usize },
    /// Field `field` lives at bit `bit` of backing byte `bitset`.
    Flag { field: usize, bitset: usize, bit: u8 },
    /// The run ended. Encode writes the byte here; decode has nothing to do.
    CloseBitset { bitset: usize },
    /// Field `field` is read or written on its own.
    Value { field: usize },
}

/// Walk fields in declared order and group runs of consecutive flags into
/// bytes. A non-flag field ends the run, so the next flag always opens a
/// fresh byte even if the previous one had spare bits.
pub fn pack(fields: &[ResolvedField]) -> Vec<CodecStep> {
    let mut steps = Vec::with_capacity(fields.len() + 2);
    let mut run: usize = 0;
    let mut bitsets: usize = 0;

    for (index, field) in fields.iter().enumerate() {
        if field.wire_type.is_flag() {
            if run % 8 == 0 {
                if run > 0 {
                    steps.push(CodecStep::CloseBitset { bitset: bitsets - 1 });
                }
                steps.push(CodecStep::OpenBitset { bitset: bitsets });
                bitsets += 1;
            }
            steps.push(CodecStep::Flag {
                field:  index,
                bitset: bitsets - 1,
                bit:    (run % 8) as u8,
            });
            run += 1;
        } else {
            if run > 0 {
                steps.push(CodecStep::CloseBitset { bitset: bitsets - 1 });
            }
            run = 0;
            steps.push(CodecStep::Value { field: index });
        }
    }

    if run > 0 {
        steps.push(CodecStep::CloseBitset { bitset: bitsets - 1 });
    }

    steps
}

/// Bit positions per backing byte, in order: what a reader of the plan sees
/// as the byte layout.
pub fn layout(steps: &[CodecStep]) -> Vec<Vec<u8>> {
    let mut bytes: Vec<Vec<u8>> = Vec::new();
    for step in steps {
        match *step {
            CodecStep::OpenBitset { .. } => bytes.push(Vec::new()),
            CodecStep::Flag { bit, .. } => {
                if let Some(current) = bytes.last_mut() {
                    current.push(bit);
                }
            }
            _ => {}
        }
    }
    bytes
}
