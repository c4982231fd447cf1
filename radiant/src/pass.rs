use glam::UVec3;
use log::debug;

use crate::{BindGroup, BindGroupBuilder, DoubleBufferedBindable};

/// Compute pipeline together with its bind groups.
///
/// Each bind group exists in two variants (see [`BindGroup`]), and the
/// variant to use is picked when the pass is run.
#[derive(Debug)]
pub struct ComputePass {
    label: String,
    bind_groups: Vec<BindGroup>,
    pipeline: wgpu::ComputePipeline,
}

impl ComputePass {
    pub fn builder<'a>(label: impl ToString) -> ComputePassBuilder<'a> {
        ComputePassBuilder {
            label: label.to_string(),
            bind_groups: Default::default(),
        }
    }

    pub fn run(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        variant: usize,
        workgroups: UVec3,
    ) {
        let label = format!("radiant_{}_pass", self.label);

        let mut pass =
            encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(&label),
                timestamp_writes: None,
            });

        pass.set_pipeline(&self.pipeline);

        for (bind_group_idx, bind_group) in self.bind_groups.iter().enumerate()
        {
            pass.set_bind_group(
                bind_group_idx as u32,
                bind_group.get(variant),
                &[],
            );
        }

        pass.dispatch_workgroups(workgroups.x, workgroups.y, workgroups.z);
    }

    /// Replaces the bind group at given index, keeping the pipeline; the new
    /// items must have the same layout as the ones they replace.
    pub fn rebind<const N: usize>(
        &mut self,
        device: &wgpu::Device,
        index: usize,
        items: [&dyn DoubleBufferedBindable; N],
    ) {
        debug!("Rebinding pass: {}; bind_group={index}", self.label);

        self.bind_groups[index] =
            bind_group(&self.label, index, items).build(device);
    }
}

pub struct ComputePassBuilder<'a> {
    label: String,
    bind_groups: Vec<BindGroupBuilder<'a>>,
}

impl<'a> ComputePassBuilder<'a> {
    pub fn bind<const N: usize>(
        mut self,
        items: [&'a dyn DoubleBufferedBindable; N],
    ) -> Self {
        let bind_group =
            bind_group(&self.label, self.bind_groups.len(), items);

        self.bind_groups.push(bind_group);
        self
    }

    pub fn build(
        self,
        device: &wgpu::Device,
        module: &wgpu::ShaderModule,
        entry_point: &str,
    ) -> ComputePass {
        debug!("Initializing pass: {}:{}", self.label, entry_point);

        let bind_groups: Vec<_> = self
            .bind_groups
            .into_iter()
            .map(|bg| bg.build(device))
            .collect();

        let bind_group_layouts: Vec<_> =
            bind_groups.iter().map(|bg| bg.layout()).collect();

        let pipeline_layout_label =
            format!("radiant_{}_pipeline_layout", self.label);

        let pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(&pipeline_layout_label),
                bind_group_layouts: &bind_group_layouts,
                push_constant_ranges: &[],
            });

        let pipeline_label = format!("radiant_{}_pipeline", self.label);

        let pipeline =
            device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some(&pipeline_label),
                layout: Some(&pipeline_layout),
                module,
                entry_point: Some(entry_point),
                compilation_options: Default::default(),
                cache: None,
            });

        ComputePass {
            label: self.label,
            bind_groups,
            pipeline,
        }
    }
}

fn bind_group<'a, const N: usize>(
    label: &str,
    index: usize,
    items: [&'a dyn DoubleBufferedBindable; N],
) -> BindGroupBuilder<'a> {
    items
        .into_iter()
        .fold(BindGroup::builder(format!("{label}_bg{index}")), |bg, item| {
            bg.add(item)
        })
}
