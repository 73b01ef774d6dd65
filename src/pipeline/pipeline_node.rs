//! Nodes running a filter pipeline in its own thread.
//!
//! `FilterNode` filters every device report as it arrives. `InterpolatorNode`
//! records reports as they arrive and emits a filtered sample on every tick
//! of a crossbeam ticker running at the pipeline frequency. Each only
//! accepts a pipeline with the matching `Schedule`; `pipeline_node` picks
//! the right one.

use crate::channel::{self, Receiver};
use crate::filter::FilterError;
use crate::pipeline::{Pipeline, Schedule};
use crate::prelude::*;
use crate::sample::Sample;
use std::time::Instant;

/// A node that filters each device report as it arrives.
#[derive(Node)]
pub struct FilterNode {
    pub input: NodeReceiver<Sample>,
    pipeline: Pipeline,
    pub sender: NodeSender<Sample>,
}

impl FilterNode {
    pub fn run(&mut self, report: Sample) -> Result<Sample, NodeError> {
        Ok(self.pipeline.filter(report, Instant::now()))
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

/// Constructs a new `FilterNode` around a `Schedule::PerReport` pipeline.
pub fn filter_node(pipeline: Pipeline) -> Result<FilterNode, FilterError> {
    match pipeline.schedule() {
        Schedule::PerReport => Ok(FilterNode::new(pipeline)),
        schedule => Err(FilterError::UnsupportedSchedule(schedule)),
    }
}

/// Constructs the node matching the pipeline's schedule.
pub fn pipeline_node(pipeline: Pipeline) -> PipelineNode {
    match pipeline.schedule() {
        Schedule::PerReport => PipelineNode::PerReport(FilterNode::new(pipeline)),
        Schedule::Timer => PipelineNode::Timer(InterpolatorNode::build(pipeline)),
    }
}

/// A node that advances a pipeline on a fixed timer rather than on device
/// reports, producing output at the pipeline frequency.
pub struct InterpolatorNode {
    pub input: NodeReceiver<Sample>,
    pipeline: Pipeline,
    ticker: Receiver<Instant>,
    pub sender: NodeSender<Sample>,
}

impl InterpolatorNode {
    /// Constructs a new `InterpolatorNode` around a `Schedule::Timer`
    /// pipeline. The ticker starts right away.
    pub fn new(pipeline: Pipeline) -> Result<InterpolatorNode, FilterError> {
        match pipeline.schedule() {
            Schedule::Timer => Ok(InterpolatorNode::build(pipeline)),
            schedule => Err(FilterError::UnsupportedSchedule(schedule)),
        }
    }

    fn build(pipeline: Pipeline) -> InterpolatorNode {
        let ticker = channel::tick(pipeline.tick_interval());
        InterpolatorNode {
            input: None,
            pipeline,
            ticker,
            sender: Vec::new(),
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

impl Node for InterpolatorNode {
    fn call(&mut self) -> Result<(), NodeError> {
        let input = self.input.as_ref().ok_or(NodeError::PermanentError)?;
        let ticker = &self.ticker;
        channel::select! {
            recv(input) -> report => {
                let report = report.map_err(|_| NodeError::DataEnd)?;
                self.pipeline.observe(report, Instant::now());
            }
            recv(ticker) -> now => {
                let now = now.map_err(|_| NodeError::CommError)?;
                if let Some(sample) = self.pipeline.tick(now) {
                    for send in &self.sender {
                        send.send(sample).map_err(|_| NodeError::CommError)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.input.is_some() && !self.sender.is_empty()
    }
}

/// Either pipeline node, picked by `pipeline_node` from the schedule.
pub enum PipelineNode {
    PerReport(FilterNode),
    Timer(InterpolatorNode),
}

impl PipelineNode {
    /// Connects a report source to this node.
    pub fn set_input(&mut self, input: Receiver<Sample>) {
        match self {
            PipelineNode::PerReport(node) => node.input = Some(input),
            PipelineNode::Timer(node) => node.input = Some(input),
        }
    }

    /// Adds a receiver for filtered samples.
    pub fn add_output(&mut self, output: Sender<Sample>) {
        match self {
            PipelineNode::PerReport(node) => node.sender.push(output),
            PipelineNode::Timer(node) => node.sender.push(output),
        }
    }
}

impl Node for PipelineNode {
    fn call(&mut self) -> Result<(), NodeError> {
        match self {
            PipelineNode::PerReport(node) => node.call(),
            PipelineNode::Timer(node) => node.call(),
        }
    }

    fn is_connected(&self) -> bool {
        match self {
            PipelineNode::PerReport(node) => node.is_connected(),
            PipelineNode::Timer(node) => node.is_connected(),
        }
    }
}
