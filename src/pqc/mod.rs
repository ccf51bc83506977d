/*!
 * Post-quantum slot adapter
 *
 * Wraps liboqs KEM and signature contexts behind one engine type so the
 * composite protocols can drive any registered post-quantum algorithm.
 */

mod pqc;

pub use pqc::*;
