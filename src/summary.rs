use crate::engine::compute_kr_progress;
use crate::errors::EngineResult;
use crate::models::{
    AnnualKr, CheckIn, KrConfig, KrSummary, Objective, ObjectiveSummary, Plan, PlanSummary, Task,
};
use crate::rollup::{compute_objective_progress, compute_plan_progress};
use chrono::NaiveDate;
use std::collections::HashMap;

// Assembles a whole dashboard from pre-fetched entity graphs. No fetching
// happens here; the caller hands in everything the plan owns.
pub fn compute_plan_summary(
    plan: &Plan,
    objectives: &[Objective],
    krs: &[AnnualKr],
    check_ins: &[CheckIn],
    tasks: &[Task],
    as_of: Option<NaiveDate>,
    configs: &HashMap<String, KrConfig>,
) -> EngineResult<PlanSummary> {
    let mut check_ins_by_kr: HashMap<&str, Vec<CheckIn>> = HashMap::new();
    for check_in in check_ins {
        check_ins_by_kr
            .entry(check_in.annual_kr_id.as_str())
            .or_default()
            .push(check_in.clone());
    }
    let mut tasks_by_kr: HashMap<&str, Vec<Task>> = HashMap::new();
    for task in tasks {
        if let Some(kr_id) = task.annual_kr_id.as_deref() {
            tasks_by_kr.entry(kr_id).or_default().push(task.clone());
        }
    }

    let empty_check_ins: Vec<CheckIn> = Vec::new();
    let empty_tasks: Vec<Task> = Vec::new();

    let mut objective_summaries = Vec::new();
    for objective in objectives.iter().filter(|objective| objective.plan_id == plan.id) {
        let mut kr_summaries = Vec::new();
        let mut kr_results = Vec::new();

        for kr in krs.iter().filter(|kr| kr.objective_id == objective.id) {
            let kr_check_ins = check_ins_by_kr.get(kr.id.as_str()).unwrap_or(&empty_check_ins);
            let kr_tasks = tasks_by_kr.get(kr.id.as_str()).unwrap_or(&empty_tasks);
            let result = compute_kr_progress(
                kr,
                kr_check_ins,
                kr_tasks,
                plan.year,
                as_of,
                configs.get(kr.id.as_str()),
            )?;
            kr_results.push((kr.id.clone(), result.clone()));
            kr_summaries.push(KrSummary {
                kr_id: kr.id.clone(),
                title: kr.title.clone(),
                result,
            });
        }

        let rollup = compute_objective_progress(&objective.id, &kr_results);
        tracing::debug!(
            objective_id = %objective.id,
            kr_count = rollup.kr_count,
            progress = rollup.progress,
            "rolled up objective"
        );
        objective_summaries.push(ObjectiveSummary {
            objective_id: objective.id.clone(),
            title: objective.title.clone(),
            rollup,
            key_results: kr_summaries,
        });
    }

    let objective_rollups: Vec<_> = objective_summaries
        .iter()
        .map(|summary| summary.rollup.clone())
        .collect();
    Ok(PlanSummary {
        plan_id: plan.id.clone(),
        title: plan.title.clone(),
        year: plan.year,
        rollup: compute_plan_progress(&plan.id, &objective_rollups),
        objectives: objective_summaries,
    })
}
