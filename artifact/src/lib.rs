//! Binary (de)serialization for the compiled Storyworld pair (`.ras`/`.rad`)
//! and VM saved state (`spec.md` §6). Every format shares one framing
//! discipline — magic, version, payload, trailing CRC-32/IEEE — grounded on
//! the `crc32fast`-checked save format in `examples/Brahmastra-Labs-logicaffeine`.

mod cursor;
mod csw;
mod debug_info;
mod framing;
mod vm_state;

pub use csw::{read_compiled_storyworld, write_compiled_storyworld};
pub use debug_info::{read_debug_info, write_debug_info};
pub use vm_state::{read_vm_state, write_vm_state, VmState, VmStateFrame};
