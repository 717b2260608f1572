//! Turns a validated classification into an ordered task list.
//!
//! The planner is pure: intent order is preserved exactly as the classifier
//! produced it (ordering is load-bearing — a report task must follow the
//! search task whose results it summarizes), and each task only carries the
//! slots its handler is allowed to see.

use crate::domain::classification::{QueryType, Slots};
use crate::domain::intent::Intent;
use crate::domain::task::{Task, TaskParams};

pub fn plan(query_type: QueryType, intents: &[Intent], slots: &Slots) -> Vec<Task> {
    match query_type {
        QueryType::OutOfScope => Vec::new(),
        QueryType::Simple | QueryType::Complex => {
            if intents.is_empty() {
                // Unreachable after the classifier's general_query
                // substitution, but an in-scope turn must never plan to
                // nothing.
                return vec![Task { intent: Intent::GeneralQuery, params: TaskParams::default() }];
            }

            intents
                .iter()
                .map(|&intent| Task { intent, params: TaskParams::project(intent, slots) })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::plan;
    use crate::domain::classification::{QueryType, Slots};
    use crate::domain::intent::Intent;
    use crate::domain::task::TaskParams;

    fn full_slots() -> Slots {
        Slots {
            location: Some("Bangalore".to_string()),
            num_rooms: Some(3),
            max_price: Some(10_000_000),
            property_size_sqft: Some(1_400),
            certificate_keywords: Some("fire safety".to_string()),
        }
    }

    #[test]
    fn out_of_scope_plans_nothing() {
        assert!(plan(QueryType::OutOfScope, &[Intent::SearchProperty], &full_slots()).is_empty());
    }

    #[test]
    fn one_task_per_intent_in_order() {
        let intents =
            [Intent::SearchProperty, Intent::EstimateRenovation, Intent::GenerateReport];
        let tasks = plan(QueryType::Complex, &intents, &full_slots());

        assert_eq!(tasks.len(), 3);
        let planned: Vec<Intent> = tasks.iter().map(|task| task.intent).collect();
        assert_eq!(planned, intents);
    }

    #[test]
    fn params_are_projected_per_task() {
        let tasks = plan(
            QueryType::Complex,
            &[Intent::SearchProperty, Intent::EstimateRenovation, Intent::GenerateReport],
            &full_slots(),
        );

        assert_eq!(tasks[0].params.location.as_deref(), Some("Bangalore"));
        assert_eq!(tasks[0].params.max_price, Some(10_000_000));
        assert!(tasks[0].params.certificate_keywords.is_none());

        assert_eq!(tasks[1].params.property_size_sqft, Some(1_400));
        assert!(tasks[1].params.location.is_none());

        assert!(tasks[2].params.is_empty());
    }

    #[test]
    fn every_planned_param_respects_the_allow_list() {
        let slots = full_slots();
        for intent in Intent::ALL {
            let tasks = plan(QueryType::Simple, &[intent], &slots);
            assert_eq!(tasks.len(), 1);
            assert_eq!(tasks[0].params, TaskParams::project(intent, &slots));
        }
    }

    #[test]
    fn empty_in_scope_intents_fall_back_to_general_query() {
        let tasks = plan(QueryType::Complex, &[], &full_slots());
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].intent, Intent::GeneralQuery);
        assert!(tasks[0].params.is_empty());
    }
}
