use super::state::{ProcessId, Ticks};

/// Half-open interval `[start, end)` of CPU ownership. `owner == None` is idle time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GanttBlock {
    pub owner: Option<ProcessId>,
    pub start: Ticks,
    pub end: Ticks,
}

impl GanttBlock {
    pub fn duration(&self) -> Ticks {
        self.end - self.start
    }
}

/// Ordered, gap-free history of CPU ownership.
///
/// Consecutive blocks never share an owner, and the blocks jointly cover
/// `[0, end())`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    blocks: Vec<GanttBlock>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute the unit interval `[start, start + 1)` to `owner`.
    pub fn record(&mut self, owner: Option<ProcessId>, start: Ticks) {
        let end = start + 1;
        let covered = self.end();
        debug_assert!(start >= covered, "interval {start} already recorded");

        if start > covered {
            // Close the gap as idle time
            self.push(None, covered, start);
        }

        self.push(owner, start, end);
    }

    fn push(&mut self, owner: Option<ProcessId>, start: Ticks, end: Ticks) {
        match self.blocks.last_mut() {
            Some(last) if last.owner == owner && last.end == start => last.end = end,
            _ => self.blocks.push(GanttBlock { owner, start, end }),
        }
    }

    pub fn blocks(&self) -> &[GanttBlock] {
        &self.blocks
    }

    /// End of the covered range.
    pub fn end(&self) -> Ticks {
        self.blocks.last().map_or(0, |block| block.end)
    }

    pub fn total_duration(&self) -> Ticks {
        self.blocks.iter().map(GanttBlock::duration).sum()
    }

    pub fn busy_time(&self, id: ProcessId) -> Ticks {
        self.blocks
            .iter()
            .filter(|block| block.owner == Some(id))
            .map(GanttBlock::duration)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_owner_extends_last_block() {
        let mut timeline = Timeline::new();
        timeline.record(None, 0);
        timeline.record(Some(0), 1);
        timeline.record(Some(0), 2);
        timeline.record(Some(1), 3);

        assert_eq!(
            timeline.blocks(),
            &[
                GanttBlock { owner: None, start: 0, end: 1 },
                GanttBlock { owner: Some(0), start: 1, end: 3 },
                GanttBlock { owner: Some(1), start: 3, end: 4 },
            ]
        );
        assert_eq!(timeline.end(), 4);
        assert_eq!(timeline.busy_time(0), 2);
    }

    #[test]
    fn gap_is_closed_as_idle() {
        let mut timeline = Timeline::new();
        timeline.record(Some(2), 0);
        timeline.record(Some(2), 3);

        assert_eq!(
            timeline.blocks(),
            &[
                GanttBlock { owner: Some(2), start: 0, end: 1 },
                GanttBlock { owner: None, start: 1, end: 3 },
                GanttBlock { owner: Some(2), start: 3, end: 4 },
            ]
        );
        assert_eq!(timeline.total_duration(), 4);
    }

    #[test]
    fn idle_ticks_merge() {
        let mut timeline = Timeline::new();
        timeline.record(None, 0);
        timeline.record(None, 1);

        assert_eq!(timeline.blocks().len(), 1);
        assert_eq!(timeline.total_duration(), 2);
    }
}
