use crate::compute;

pub trait CommandEncoderExt {
    fn with_compute_pass<'pass, A>(
        &'pass mut self,
        label: &str,
        function: impl FnOnce(&mut wgpu::ComputePass<'pass>) -> A,
    ) -> A;

    /// Run `pipeline` once for every index in `0..total_work`.
    fn dispatch_per_index(
        &mut self,
        label: &str,
        pipeline: &wgpu::ComputePipeline,
        bind_group: &wgpu::BindGroup,
        total_work: usize,
    );
}

impl CommandEncoderExt for wgpu::CommandEncoder {
    fn with_compute_pass<'pass, A>(
        &'pass mut self,
        label: &str,
        function: impl FnOnce(&mut wgpu::ComputePass<'pass>) -> A,
    ) -> A {
        let mut compute_pass =
            self.begin_compute_pass(&wgpu::ComputePassDescriptor { label: Some(label) });
        function(&mut compute_pass)
    }

    fn dispatch_per_index(
        &mut self,
        label: &str,
        pipeline: &wgpu::ComputePipeline,
        bind_group: &wgpu::BindGroup,
        total_work: usize,
    ) {
        self.push_debug_group(label);
        self.with_compute_pass(label, |compute_pass| {
            compute_pass.set_pipeline(pipeline);
            compute_pass.set_bind_group(0, bind_group, &[]);
            let (x, y, z) = compute::dispatch_size(total_work);
            compute_pass.dispatch_workgroups(x, y, z);
        });
        self.pop_debug_group();
    }
}
