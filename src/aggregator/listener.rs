use super::ChangeAggregator;

/// Consumer of a finished transaction, e.g. a re-analysis pass that revisits
/// the changed subtrees.
pub trait ChangeListener<N> {
    fn tree_changed(&mut self, changes: &ChangeAggregator<N>);
}

impl<N, F> ChangeListener<N> for F
where
    F: FnMut(&ChangeAggregator<N>),
{
    fn tree_changed(&mut self, changes: &ChangeAggregator<N>) {
        self(changes)
    }
}
