use serde::{Deserialize, Serialize};

use crate::bytecode::ir::Program;

pub const MAGIC: [u8; 4] = *b"PLSR";

/// Bumped whenever `Op`, `Value` or `Program` change shape.
pub const VERSION: u16 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("not a pulsar bytecode image")]
    BadMagic,

    #[error("bytecode image version {found} is not supported (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },

    #[error("{count} unexpected bytes after the program")]
    TrailingBytes { count: usize },

    #[error("corrupt bytecode image: {0}")]
    Decode(#[from] postcard::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    magic: [u8; 4],
    version: u16,
}

/// Serialize a compiled program: header, then the postcard-encoded program.
pub fn encode(program: &Program) -> Result<Vec<u8>, ImageError> {
    let mut bytes = postcard::to_allocvec(&Header {
        magic: MAGIC,
        version: VERSION,
    })?;
    bytes.extend(postcard::to_allocvec(program)?);
    Ok(bytes)
}

/// Load a program written by `encode`.
///
/// The header is checked before the body is decoded, so an image from another
/// compiler version is reported as such rather than as corruption.
pub fn decode(bytes: &[u8]) -> Result<Program, ImageError> {
    let (header, rest) = postcard::take_from_bytes::<Header>(bytes).map_err(|_| ImageError::BadMagic)?;

    if header.magic != MAGIC {
        return Err(ImageError::BadMagic);
    }
    if header.version != VERSION {
        return Err(ImageError::UnsupportedVersion {
            found: header.version,
            expected: VERSION,
        });
    }

    let (program, rest) = postcard::take_from_bytes::<Program>(rest)?;
    if !rest.is_empty() {
        return Err(ImageError::TrailingBytes { count: rest.len() });
    }
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::compile::compile;
    use crate::bytecode::{Instruction, Op};
    use crate::driver::{Pulsar, PulsarError};
    use crate::frontend::lexer::tokenize;
    use crate::runtime::fault::{Fault, FaultKind};

    fn sample() -> Program {
        let compilation = compile(&tokenize(
            "var x: double = 2.5; { var b: bool = x > 1; if (b) print null; }",
        ));
        assert!(!compilation.has_errors());
        compilation.program
    }

    #[test]
    fn test_image_preserves_program() {
        let program = sample();
        let bytes = encode(&program).unwrap();
        assert_eq!(&bytes[..4], b"PLSR");
        assert_eq!(decode(&bytes).unwrap(), program);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = encode(&sample()).unwrap();
        bytes[0] = b'X';
        assert!(matches!(decode(&bytes), Err(ImageError::BadMagic)));
        assert!(matches!(decode(&[]), Err(ImageError::BadMagic)));
    }

    #[test]
    fn test_version_mismatch() {
        let mut bytes = postcard::to_allocvec(&Header {
            magic: MAGIC,
            version: VERSION + 1,
        })
        .unwrap();
        bytes.extend(postcard::to_allocvec(&sample()).unwrap());

        match decode(&bytes) {
            Err(ImageError::UnsupportedVersion { found, expected }) => {
                assert_eq!(found, VERSION + 1);
                assert_eq!(expected, VERSION);
            }
            other => panic!("expected version error, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_body() {
        let bytes = encode(&sample()).unwrap();
        let truncated = &bytes[..bytes.len() - 3];
        assert!(matches!(decode(truncated), Err(ImageError::Decode(_))));
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = encode(&Program::new()).unwrap();
        bytes.push(0);
        assert!(matches!(
            decode(&bytes),
            Err(ImageError::TrailingBytes { count: 1 })
        ));
    }

    #[test]
    fn test_crafted_local_slots_fault_instead_of_panicking() {
        for op in [Op::NewLocal(usize::MAX), Op::SetLocal(usize::MAX)] {
            let program = Program {
                code: vec![
                    Instruction::new(Op::Null, 1),
                    Instruction::new(Op::Null, 1),
                    Instruction::new(op, 1),
                ],
                ..Program::new()
            };
            let bytes = encode(&program).unwrap();

            let err = Pulsar::default().exec(&bytes, Vec::new()).unwrap_err();
            assert!(
                matches!(
                    err,
                    PulsarError::Runtime(Fault {
                        kind: FaultKind::InvalidProgram(_),
                        ip: 2,
                        ..
                    })
                ),
                "{:?}",
                err
            );
        }
    }
}
