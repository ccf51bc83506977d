/*!
 * Algorithm registry
 *
 * Maps combined algorithm names such as `p256_mlkem768` or `mldsa65_p256` to
 * their slot algorithms, combination kind and claimed security. The table is
 * immutable and indexed once on first use.
 */

mod registry;
mod table;

pub use registry::*;
