//! Rayon-parallel IoU rows (feature-gated).
//!
//! Large candidate sets are split into fixed-size chunks and each chunk is
//! evaluated by the selected kernel on the rayon pool. Small rows run inline
//! since scheduling would dominate.

use crate::geometry::BBox;
use crate::kernel::IouKernel;
use rayon::prelude::*;

/// Candidates per parallel task.
const CHUNK: usize = 1024;

/// Chunk-parallel IoU row using kernel `K` per chunk.
pub fn iou_row_par<K: IouKernel>(anchor: &BBox, others: &[BBox], out: &mut [f32]) {
    let len = others.len().min(out.len());
    if len <= CHUNK {
        K::iou_row(anchor, &others[..len], &mut out[..len]);
        return;
    }

    out[..len]
        .par_chunks_mut(CHUNK)
        .zip(others[..len].par_chunks(CHUNK))
        .for_each(|(slots, chunk)| K::iou_row(anchor, chunk, slots));
}

#[cfg(test)]
mod tests {
    use super::iou_row_par;
    use crate::geometry::BBox;
    use crate::kernel::scalar::IouScalar;
    use crate::kernel::IouKernel;

    #[test]
    fn parallel_row_matches_sequential_row() {
        let anchor = BBox::new(100.0, 100.0, 300.0, 260.0);
        let others: Vec<BBox> = (0..5000)
            .map(|i| {
                let x = (i % 97) as f32 * 4.0;
                let y = (i % 53) as f32 * 5.0;
                BBox::new(x, y, x + 120.0, y + 90.0)
            })
            .collect();

        let mut seq = vec![0.0f32; others.len()];
        let mut par = vec![0.0f32; others.len()];
        IouScalar::iou_row(&anchor, &others, &mut seq);
        iou_row_par::<IouScalar>(&anchor, &others, &mut par);
        assert_eq!(seq, par);
    }
}
