//! 二进制命令流：本机字节序的 4 字节有符号整数记录。
//!
//! The first record is a header holding the number of `MARK` commands in the
//! stream. Every command is an opcode record, followed by one operand record
//! for `VALUE`, `QUERY` and `CLOSE`. An empty input is an empty stream.
use std::fmt;
use std::io::{self, Read, Write};

use byteorder::{ByteOrder, NativeEndian, WriteBytesExt};
use serde::Serialize;
use thiserror::Error;

pub const RECORD_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(i32)]
pub enum Opcode {
    Value = 0,
    Mark = 1,
    Query = 2,
    Close = 3,
}

impl Opcode {
    pub fn has_operand(self) -> bool {
        !matches!(self, Opcode::Mark)
    }
}

impl TryFrom<i32> for Opcode {
    type Error = i32;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Opcode::Value),
            1 => Ok(Opcode::Mark),
            2 => Ok(Opcode::Query),
            3 => Ok(Opcode::Close),
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Value(i32),
    Mark,
    Query(i32),
    Close(i32),
}

impl Command {
    pub fn opcode(self) -> Opcode {
        match self {
            Command::Value(_) => Opcode::Value,
            Command::Mark => Opcode::Mark,
            Command::Query(_) => Opcode::Query,
            Command::Close(_) => Opcode::Close,
        }
    }

    fn operand(self) -> Option<i32> {
        match self {
            Command::Value(v) | Command::Query(v) | Command::Close(v) => Some(v),
            Command::Mark => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Value(v) => write!(f, "V{v}"),
            Command::Mark => write!(f, "M"),
            Command::Query(key) => write!(f, "Q{key}"),
            Command::Close(key) => write!(f, "C{key}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("stream of {len} bytes is not a whole number of {RECORD_SIZE}-byte records")]
    Misaligned { len: usize },
    #[error("record {record}: unknown opcode {opcode}")]
    UnknownOpcode { record: usize, opcode: i32 },
    #[error("record {record}: {opcode:?} is missing its operand")]
    Truncated { record: usize, opcode: Opcode },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandStream {
    /// Mark count announced by the header. Advisory only.
    pub declared_marks: i32,
    pub commands: Vec<Command>,
}

impl CommandStream {
    /// Stream whose header matches its commands.
    pub fn new(commands: Vec<Command>) -> Self {
        let mut stream = Self {
            declared_marks: 0,
            commands,
        };
        stream.declared_marks = stream.mark_count() as i32;
        stream
    }

    pub fn mark_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|command| **command == Command::Mark)
            .count()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, StreamError> {
        if bytes.len() % RECORD_SIZE != 0 {
            return Err(StreamError::Misaligned { len: bytes.len() });
        }
        let mut records = vec![0i32; bytes.len() / RECORD_SIZE];
        NativeEndian::read_i32_into(bytes, &mut records);

        let Some((&declared_marks, body)) = records.split_first() else {
            return Ok(Self::default());
        };

        let mut commands = Vec::new();
        let mut i = 0;
        while i < body.len() {
            let record = i + 1;
            let opcode = Opcode::try_from(body[i])
                .map_err(|opcode| StreamError::UnknownOpcode { record, opcode })?;
            i += 1;
            if !opcode.has_operand() {
                commands.push(Command::Mark);
                continue;
            }
            let Some(&operand) = body.get(i) else {
                return Err(StreamError::Truncated { record, opcode });
            };
            i += 1;
            commands.push(match opcode {
                Opcode::Value => Command::Value(operand),
                Opcode::Query => Command::Query(operand),
                Opcode::Close => Command::Close(operand),
                Opcode::Mark => unreachable!(),
            });
        }

        Ok(Self {
            declared_marks,
            commands,
        })
    }

    /// Reads `reader` to the end, then decodes. Nothing is returned for a
    /// malformed stream, whatever its length.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self, StreamError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::decode(&bytes)
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_i32::<NativeEndian>(self.declared_marks)?;
        for command in &self.commands {
            writer.write_i32::<NativeEndian>(command.opcode() as i32)?;
            if let Some(operand) = command.operand() {
                writer.write_i32::<NativeEndian>(operand)?;
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let records: Vec<i32> = std::iter::once(self.declared_marks)
            .chain(self.commands.iter().flat_map(|command| {
                std::iter::once(command.opcode() as i32).chain(command.operand())
            }))
            .collect();
        let mut bytes = vec![0u8; records.len() * RECORD_SIZE];
        NativeEndian::write_i32_into(&records, &mut bytes);
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(records: &[i32]) -> Vec<u8> {
        let mut bytes = vec![0u8; records.len() * RECORD_SIZE];
        NativeEndian::write_i32_into(records, &mut bytes);
        bytes
    }

    #[test]
    fn decodes_every_opcode() {
        let bytes = encode(&[1, 0, 5, 0, 3, 1, 2, 2, 3, 2]);
        let stream = CommandStream::decode(&bytes).unwrap();
        assert_eq!(stream.declared_marks, 1);
        assert_eq!(
            stream.commands,
            vec![
                Command::Value(5),
                Command::Value(3),
                Command::Mark,
                Command::Query(2),
                Command::Close(2),
            ]
        );
    }

    #[test]
    fn empty_input_is_an_empty_stream() {
        assert_eq!(CommandStream::decode(&[]).unwrap(), CommandStream::default());
        let header_only = CommandStream::decode(&encode(&[0])).unwrap();
        assert!(header_only.commands.is_empty());
    }

    #[test]
    fn misaligned_input_is_rejected() {
        let err = CommandStream::decode(&[0, 0, 0, 0, 1, 0]).unwrap_err();
        assert!(matches!(err, StreamError::Misaligned { len: 6 }));
    }

    #[test]
    fn unknown_opcode_is_rejected() {
        let err = CommandStream::decode(&encode(&[0, 1, 9])).unwrap_err();
        assert!(matches!(
            err,
            StreamError::UnknownOpcode {
                record: 2,
                opcode: 9
            }
        ));
    }

    #[test]
    fn missing_operand_is_rejected() {
        let err = CommandStream::decode(&encode(&[0, 1, 2])).unwrap_err();
        assert!(matches!(
            err,
            StreamError::Truncated {
                record: 2,
                opcode: Opcode::Query
            }
        ));
    }

    #[test]
    fn writer_and_to_bytes_agree() {
        let stream = CommandStream::new(vec![
            Command::Value(-7),
            Command::Mark,
            Command::Close(1),
        ]);
        assert_eq!(stream.declared_marks, 1);
        let mut written = Vec::new();
        stream.write_to(&mut written).unwrap();
        assert_eq!(written, stream.to_bytes());
        assert_eq!(CommandStream::decode(&written).unwrap(), stream);
    }

    #[test]
    fn read_from_consumes_the_reader() {
        let bytes = encode(&[0, 1]);
        let stream = CommandStream::read_from(bytes.as_slice()).unwrap();
        assert_eq!(stream.commands, vec![Command::Mark]);
    }

    #[test]
    fn display_uses_script_tags() {
        let rendered: Vec<String> = [
            Command::Value(4),
            Command::Mark,
            Command::Query(2),
            Command::Close(3),
        ]
        .iter()
        .map(ToString::to_string)
        .collect();
        assert_eq!(rendered, vec!["V4", "M", "Q2", "C3"]);
    }
}
