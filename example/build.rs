// Compiles protocol.xml into $OUT_DIR/protocol.rs, included by src/lib.rs.

use std::env;
use std::error::Error;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn Error>> {
    println!("cargo:rerun-if-changed=protocol.xml");

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    amqp_gen::write_generated("protocol.xml", out_dir.join("protocol.rs"))?;
    Ok(())
}
