use unicode_segmentation::UnicodeSegmentation;

#[derive(Clone, Debug)]
pub struct ChunkingConfig {
	pub max_chars: usize,
	pub overlap_chars: usize,
}

#[derive(Clone, Debug)]
pub struct Fragment {
	pub fragment_index: i32,
	pub start_offset: usize,
	pub end_offset: usize,
	pub text: String,
}

/// Splits text into overlapping fragments of at most `max_chars` characters.
///
/// Split points prefer a paragraph break, then a line break, then a word
/// boundary inside the window; a hard cut only happens when the window is one
/// unbroken run. Consecutive fragments overlap by `overlap_chars` characters
/// so context survives the boundary.
pub fn split_text(text: &str, cfg: &ChunkingConfig) -> Vec<Fragment> {
	let total = text.len();
	let mut fragments = Vec::new();
	let mut start = 0_usize;
	let mut fragment_index = 0_i32;

	while start < total {
		let window_end = advance_chars(text, start, cfg.max_chars.max(1));

		if window_end >= total {
			fragments.push(Fragment {
				fragment_index,
				start_offset: start,
				end_offset: total,
				text: text[start..total].to_string(),
			});

			break;
		}

		let end = start + split_point(&text[start..window_end]);

		fragments.push(Fragment {
			fragment_index,
			start_offset: start,
			end_offset: end,
			text: text[start..end].to_string(),
		});

		fragment_index += 1;

		let next = retreat_chars(text, end, cfg.overlap_chars);

		// The overlap must never stall the walk on short fragments.
		start = if next > start { next } else { end };
	}

	fragments
}

/// Relative byte offset of the preferred split point inside a full window.
fn split_point(window: &str) -> usize {
	if let Some(pos) = window.rfind("\n\n") {
		let cut = pos + 2;

		if cut < window.len() {
			return cut;
		}
	}
	if let Some(pos) = window.rfind('\n') {
		let cut = pos + 1;

		if cut < window.len() {
			return cut;
		}
	}
	if let Some((pos, _)) = window.unicode_word_indices().last()
		&& pos > 0
	{
		return pos;
	}

	window.len()
}

/// Byte offset `count` characters past `start`, clamped to the text length.
fn advance_chars(text: &str, start: usize, count: usize) -> usize {
	text[start..].char_indices().nth(count).map(|(idx, _)| start + idx).unwrap_or(text.len())
}

/// Byte offset `count` characters before `end`.
fn retreat_chars(text: &str, end: usize, count: usize) -> usize {
	let mut offset = end;

	for (taken, (idx, _)) in text[..end].char_indices().rev().enumerate() {
		if taken == count {
			break;
		}

		offset = idx;
	}

	offset
}
