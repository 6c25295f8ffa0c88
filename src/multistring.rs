//! Packed multi-string buffers.
//!
//! Zero or more NUL-terminated UTF-16 strings concatenated back to back,
//! with one extra NUL closing the whole block. The host reports a result
//! length alongside the buffer, but that length is untrusted input: decoding
//! walks terminator to terminator and only uses the reported length as an
//! upper bound.

/// Decodes a packed multi-string buffer into its substrings, in order.
///
/// A zero-length run at the current offset is the block terminator and ends
/// decoding. An empty block (a lone NUL) decodes to an empty set.
pub fn decode(buf: &[u16], reported_len: usize) -> Vec<String> {
	let bound = reported_len.min(buf.len());
	let mut items = Vec::new();
	let mut at = 0;
	while at < bound {
		let end = buf[at..bound]
			.iter()
			.position(|&ch| ch == 0)
			.map_or(bound, |pos| at + pos);
		if end == at {
			break;
		}
		items.push(String::from_utf16_lossy(&buf[at..end]));
		at = end + 1;
	}
	items
}

/// Encodes substrings into the packed multi-string form, block terminator
/// included.
pub fn encode<S: AsRef<str>>(items: &[S]) -> Vec<u16> {
	let mut buf = Vec::new();
	for item in items {
		buf.extend(item.as_ref().encode_utf16());
		buf.push(0);
	}
	buf.push(0);
	buf
}
