//! 외부 렌더링용 출력 슬롯

use candle_core::Tensor;

use crate::core::error::VideoResult;
use crate::core::types::Clip;

/// 이름 붙은 표시 프레임 (`frame_0`, `frame_1`, ...)
#[derive(Debug, Clone)]
pub struct DisplayFrame {
    pub name: String,
    pub frame_index: usize,
    pub frame: Tensor,
}

/// 앞 `n/2` 프레임과 뒤 `n/2` 프레임의 인덱스
///
/// 슬롯 수는 클립 길이와 상관없이 항상 `2 * (n/2)` 이다. 짧은 클립은 마지막 프레임으로 채운다.
pub fn display_indices(clip_len: usize, num_display_frames: usize) -> Vec<usize> {
    if clip_len == 0 {
        return Vec::new();
    }
    let half = num_display_frames / 2;
    let last = clip_len - 1;
    let tail = clip_len.saturating_sub(half);
    (0..half)
        .map(|i| i.min(last))
        .chain((0..half).map(|i| (tail + i).min(last)))
        .collect()
}

pub fn display_frames(clip: &Clip, num_display_frames: usize) -> Vec<DisplayFrame> {
    display_indices(clip.len(), num_display_frames)
        .into_iter()
        .enumerate()
        .filter_map(|(slot, frame_index)| {
            clip.frame(frame_index).map(|frame| DisplayFrame {
                name: format!("frame_{}", slot),
                frame_index,
                frame: frame.clone(),
            })
        })
        .collect()
}

/// `(N, T, H, W, C)` 배치, 값 범위 [0, 256]
pub fn to_byte_video(clip: &Clip) -> VideoResult<Tensor> {
    let video = clip.to_tensor()?.affine(256.0, 0.0)?;
    Ok(video.permute((0, 1, 3, 4, 2))?)
}
