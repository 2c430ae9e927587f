use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use crate::models::learner_word::LearnerWordState;
use crate::models::vocabulary::VocabularyEntry;
use crate::scheduler::maintenance::MaintenanceTask;

/// One presentable word: the learner's state plus its catalog entry.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BatchItem {
    pub state: LearnerWordState,
    pub entry: VocabularyEntry,
}

impl BatchItem {
    /// The vocabulary entry id, which is how words are referenced in a session.
    pub fn word_id(&self) -> Uuid {
        self.entry.id
    }
}

/// Ephemeral in-memory run of one lesson / practice session.
///
/// The live queue only ever grows (failed words are re-appended); `target_size`
/// is the initial length and never changes. The batch is finished once every
/// distinct initial word has been answered correctly at least once.
#[derive(Debug, Clone)]
pub struct SessionBatch {
    learner_id: Uuid,
    queue: Vec<BatchItem>,
    cursor: usize,
    target_size: usize,
    completed: HashSet<Uuid>,
    completion_order: Vec<Uuid>,
    finished: bool,
    refill: Option<MaintenanceTask>,
}

impl SessionBatch {
    pub fn new(learner_id: Uuid, items: Vec<BatchItem>) -> Self {
        let target_size = items.len();
        Self {
            learner_id,
            queue: items,
            cursor: 0,
            target_size,
            completed: HashSet::new(),
            completion_order: Vec::new(),
            finished: target_size == 0,
            refill: None,
        }
    }

    /// Maintenance to fire once the batch graduates.
    pub fn with_refill(mut self, task: MaintenanceTask) -> Self {
        self.refill = Some(task);
        self
    }

    pub fn learner_id(&self) -> Uuid {
        self.learner_id
    }

    pub fn items(&self) -> &[BatchItem] {
        &self.queue
    }

    /// Length of the live queue, including recycled entries.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn target_size(&self) -> usize {
        self.target_size
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> Option<&BatchItem> {
        if self.finished {
            return None;
        }
        self.queue.get(self.cursor)
    }

    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    /// Word ids in the order they were first answered correctly.
    pub fn completion_order(&self) -> &[Uuid] {
        &self.completion_order
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn refill(&self) -> Option<&MaintenanceTask> {
        self.refill.as_ref()
    }

    /// State ids of every completed word, deduplicated.
    pub fn completed_state_ids(&self) -> Vec<Uuid> {
        let mut seen = HashSet::new();
        self.completion_order
            .iter()
            .filter_map(|word_id| self.queue.iter().find(|item| item.word_id() == *word_id))
            .map(|item| item.state.id)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Marks the current word completed without moving the cursor.
    /// Returns false when it was already completed earlier in the session.
    pub(crate) fn complete_current(&mut self) -> bool {
        let Some(word_id) = self.current().map(BatchItem::word_id) else {
            return false;
        };
        if self.completed.insert(word_id) {
            self.completion_order.push(word_id);
            true
        } else {
            false
        }
    }

    /// Re-appends the current word to the end of the queue and moves on.
    pub(crate) fn recycle_current(&mut self) {
        if let Some(item) = self.current().cloned() {
            self.queue.push(item);
            self.cursor += 1;
        }
    }

    pub(crate) fn advance(&mut self) {
        if self.cursor < self.queue.len() {
            self.cursor += 1;
        }
    }

    pub(crate) fn mark_finished(&mut self) {
        self.finished = true;
    }
}
