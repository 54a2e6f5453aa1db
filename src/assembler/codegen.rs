//! Code generation: linear IR to opcode array.
//!
//! Two passes. The first walks the node list, appending cells and recording
//! where every label is declared and used. The second backpatches each label
//! usage with the declared address plus its evaluated offset. Only then can a
//! forward reference resolve, which is the reason this stage is two-pass at
//! all.
//!
//! All bookkeeping lives in plain vectors indexed by insertion order, so the
//! same source always produces byte-identical output.

use crate::assembler::parser::{LazyValue, Node, VariableTable};
use crate::error::CompileError;
use crate::word::Word;

/// Where a label lives and every cell that refers to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelInfo {
    pub name: String,
    pub address: usize,
    /// Cells (addresses into the opcode array) backpatched with this label.
    pub occurrences: Vec<usize>,
}

/// The output of a compile: the opcode array plus the tables a debugger or
/// visualizer needs to map cells back to source constructs.
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    pub word: Word,
    pub opcodes: Vec<u32>,
    /// Declared labels in declaration order.
    pub labels: Vec<LabelInfo>,
    /// Cells holding a register operand, with the register's name.
    pub registers: Vec<(usize, String)>,
    /// Cells holding a self-relative address, with the evaluated offset.
    pub offsets: Vec<(usize, i64)>,
}

impl CompiledProgram {
    pub fn len(&self) -> usize {
        self.opcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opcodes.is_empty()
    }

    pub fn label(&self, name: &str) -> Option<&LabelInfo> {
        self.labels.iter().find(|label| label.name == name)
    }
}

struct PendingLabel {
    cell: usize,
    name: String,
    offset: Option<LazyValue>,
}

/// Lowers the IR to the final opcode array.
pub fn generate(
    nodes: &[Node],
    variables: &VariableTable,
    word: Word,
) -> Result<CompiledProgram, CompileError> {
    let mut opcodes: Vec<u32> = Vec::new();
    let mut labels: Vec<LabelInfo> = Vec::new();
    let mut label_index: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    let mut registers: Vec<(usize, String)> = Vec::new();
    let mut offsets: Vec<(usize, i64)> = Vec::new();
    let mut pending: Vec<PendingLabel> = Vec::new();
    let mut stack: Vec<String> = Vec::new();

    let eval = |value: &LazyValue, stack: &mut Vec<String>| -> Result<i64, CompileError> {
        stack.clear();
        Ok(value.eval(variables, stack)? as i64)
    };

    // Pass 1: emit cells, collect label declarations and usages.
    for node in nodes {
        match node {
            Node::Instruction { instruction, .. } => {
                opcodes.push(instruction.opcode());
            }
            Node::Value { value, .. } => {
                let cell = eval(value, &mut stack)?;
                opcodes.push(truncate(cell, word));
            }
            Node::Register { address, name, .. } => {
                registers.push((opcodes.len(), name.clone()));
                opcodes.push(truncate(*address as i64, word));
            }
            Node::LabelDecl { name, location } => {
                if label_index.contains_key(name) {
                    return Err(CompileError::Type {
                        message: format!("label `{}` declared twice", name),
                        location: location.clone(),
                    });
                }
                label_index.insert(name.clone(), labels.len());
                labels.push(LabelInfo {
                    name: name.clone(),
                    address: opcodes.len(),
                    occurrences: Vec::new(),
                });
            }
            Node::LabelUsage { name, offset, .. } => {
                pending.push(PendingLabel {
                    cell: opcodes.len(),
                    name: name.clone(),
                    offset: offset.clone(),
                });
                opcodes.push(0);
            }
            Node::SelfOffset { value, .. } => {
                let cell = opcodes.len();
                let delta = eval(value, &mut stack)?;
                offsets.push((cell, delta));
                opcodes.push(truncate(cell as i64 + delta, word));
            }
            Node::Str { text, .. } => {
                for ch in text.chars() {
                    opcodes.push(truncate(i64::from(u32::from(ch)), word));
                }
            }
            Node::Array {
                length,
                values,
                location,
            } => {
                // The length is lazy like every other value, so it resolves
                // here against the complete variable table.
                let cells = eval(length, &mut stack)?;
                if cells < 0 {
                    return Err(CompileError::Type {
                        message: format!("array length {} is negative", cells),
                        location: location.clone(),
                    });
                }
                let cells = cells as usize;
                let address_space = word.mask() as usize + 1;
                if cells > address_space {
                    return Err(CompileError::Type {
                        message: format!(
                            "array of {} cells exceeds the {}-cell address space",
                            cells, address_space
                        ),
                        location: location.clone(),
                    });
                }
                if values.len() > cells {
                    return Err(CompileError::Type {
                        message: format!(
                            "array holds {} values but is declared with length {}",
                            values.len(),
                            cells
                        ),
                        location: location.clone(),
                    });
                }
                for value in values {
                    let cell = eval(value, &mut stack)?;
                    opcodes.push(truncate(cell, word));
                }
                for _ in values.len()..cells {
                    opcodes.push(0);
                }
            }
        }
    }

    // Pass 2: backpatch label usages now that every address is known.
    for usage in &pending {
        let Some(index) = label_index.get(&usage.name).copied() else {
            // The error names every cell waiting on this label, not just the
            // first one encountered.
            let occurrences = pending
                .iter()
                .filter(|other| other.name == usage.name)
                .map(|other| other.cell)
                .collect();
            return Err(CompileError::UndefinedLabel {
                name: usage.name.clone(),
                occurrences,
            });
        };
        let base = labels[index].address as i64;
        let delta = match &usage.offset {
            Some(offset) => eval(offset, &mut stack)?,
            None => 0,
        };
        opcodes[usage.cell] = truncate(base + delta, word);
        labels[index].occurrences.push(usage.cell);
    }

    tracing::debug!(
        cells = opcodes.len(),
        labels = labels.len(),
        "code generation finished"
    );

    Ok(CompiledProgram {
        word,
        opcodes,
        labels,
        registers,
        offsets,
    })
}

/// Masks a signed value into the word; negative values wrap two's-complement.
fn truncate(value: i64, word: Word) -> u32 {
    (value as u32) & word.mask()
}
