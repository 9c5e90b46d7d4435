/// Workgroup size along `y` for both shaders (`@workgroup_size(1, 64, 1)`).
pub const WORKGROUP_SIZE_Y: u32 = 64;

/// Workgroups dispatched along `y`.
pub const DISPATCH_SIZE_Y: u32 = 1024;

/// Invocations covered by one step of `global_invocation_id.x`. The shaders
/// recover their linear index as `id.x * INVOCATIONS_PER_ROW + id.y`.
pub const INVOCATIONS_PER_ROW: u32 = DISPATCH_SIZE_Y * WORKGROUP_SIZE_Y;

/**
Dispatch size for a one-index-per-pixel pass over `total_work` pixels.

A single dispatch dimension is capped at 65535 workgroups
([maxComputeWorkgroupsPerDimension](https://www.w3.org/TR/webgpu/#dom-supported-limits-maxcomputeworkgroupsperdimension)),
which a 1080p frame at 4 samples per pixel already exceeds. The index space is
therefore folded into rows of `1024 * 64 = 65536` invocations: `y` covers one
row, `x` counts rows. Up to one row of trailing invocations is redundant; the
shaders discard any index at or past `total_work`.
*/
pub fn dispatch_size(total_work: usize) -> (u32, u32, u32) {
    let rows = total_work / INVOCATIONS_PER_ROW as usize + 1;
    (rows as u32, DISPATCH_SIZE_Y, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn covers_every_index() {
        for total in [1, 65535, 65536, 65537, 1920 * 1080 * 16] {
            let (x, y, z) = dispatch_size(total);
            let invocations = x as usize * y as usize * WORKGROUP_SIZE_Y as usize * z as usize;
            assert!(invocations >= total);
            assert!(invocations - total <= INVOCATIONS_PER_ROW as usize);
        }
    }
}
