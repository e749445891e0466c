//! Reading the best detection out of a YOLOv8-style detection head.
//!
//! The head is `[1, 4 + classes, anchors]` as exported by ultralytics, or the
//! transposed `[1, anchors, 4 + classes]` some exporters produce.  Only the
//! single strongest class score matters here, so no suppression pass is run.

use crate::error::VisionError;

const BOX_CHANNELS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    ChannelsFirst,
    AnchorsFirst,
}

/// Best `(class_id, score)` over all anchors, or `None` for an empty head.
pub(crate) fn decode_best(
    output: &[f32],
    shape: &[i64],
    num_classes: usize,
) -> Result<Option<(usize, f32)>, VisionError> {
    let bad_shape = || VisionError::OutputShape(shape.to_vec());

    let (a, b) = match shape {
        [1, a, b] if *a > 0 && *b >= 0 => (*a as usize, *b as usize),
        _ => return Err(bad_shape()),
    };
    if output.len() != a * b {
        return Err(bad_shape());
    }

    let expected = BOX_CHANNELS + num_classes;
    let layout = if num_classes > 0 && a == expected {
        Layout::ChannelsFirst
    } else if num_classes > 0 && b == expected {
        Layout::AnchorsFirst
    } else if a <= b {
        Layout::ChannelsFirst
    } else {
        Layout::AnchorsFirst
    };

    let (channels, anchors) = match layout {
        Layout::ChannelsFirst => (a, b),
        Layout::AnchorsFirst => (b, a),
    };
    if channels <= BOX_CHANNELS {
        return Err(bad_shape());
    }
    let classes = channels - BOX_CHANNELS;

    let score = |anchor: usize, class: usize| match layout {
        Layout::ChannelsFirst => output[(BOX_CHANNELS + class) * anchors + anchor],
        Layout::AnchorsFirst => output[anchor * channels + BOX_CHANNELS + class],
    };

    let mut best: Option<(usize, f32)> = None;
    for anchor in 0..anchors {
        for class in 0..classes {
            let s = score(anchor, class);
            if best.is_none_or(|(_, top)| s > top) {
                best = Some((class, s));
            }
        }
    }
    Ok(best)
}
