use crate::util;

/// Scorers annotate candidates with a score without reordering them.
///
/// `score` returns scored copies; `update` writes the relevant score fields
/// back onto the original candidate. Splitting the two keeps scorers free
/// of aliasing issues when several run over the same batch.
pub trait Scorer<Q, C>: Send + Sync
where
    Q: Clone + Send + Sync + 'static,
    C: Clone + Send + Sync + 'static,
{
    /// Decide if this scorer should run for the given query.
    fn enable(&self, _query: &Q) -> bool {
        true
    }

    /// Score the candidate batch, returning one scored copy per input.
    fn score(&self, query: &Q, candidates: &[C]) -> Result<Vec<C>, String>;

    /// Copy the scores produced by `score` onto the original candidate.
    fn update(&self, candidate: &mut C, scored: C);

    /// Returns a stable name for logging/metrics.
    fn name(&self) -> &str {
        util::short_type_name(std::any::type_name::<Self>())
    }
}
