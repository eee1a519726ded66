//! Role labels for chains, tailored to a problem domain

const TEMPLATES: &[(&str, [&str; 3])] = &[
    (
        "mathematics",
        [
            "Theorem Prover (ensures logical rigor and mathematical correctness)",
            "Problem Solver (focuses on computational methods and algorithms)",
            "Concept Explainer (ensures clarity and pedagogical soundness)",
        ],
    ),
    (
        "ethics",
        [
            "Utilitarian Analyst (focuses on consequences and overall welfare)",
            "Deontological Reviewer (focuses on duties, rights, and principles)",
            "Virtue Ethics Advocate (focuses on character and moral virtues)",
        ],
    ),
    (
        "programming",
        [
            "Code Architect (focuses on design patterns and structure)",
            "Performance Optimizer (focuses on efficiency and scalability)",
            "Security Auditor (focuses on vulnerabilities and best practices)",
        ],
    ),
    (
        "science",
        [
            "Experimental Designer (focuses on methodology and controls)",
            "Data Analyst (focuses on statistical validity and interpretation)",
            "Peer Reviewer (focuses on reproducibility and significance)",
        ],
    ),
    (
        "business",
        [
            "Strategic Planner (focuses on long-term vision and competitive advantage)",
            "Financial Analyst (focuses on costs, revenues, and ROI)",
            "Risk Manager (focuses on potential problems and mitigation)",
        ],
    ),
    (
        "creative",
        [
            "Concept Developer (generates original ideas and themes)",
            "Structure Designer (focuses on organization and flow)",
            "Audience Advocate (ensures clarity and engagement)",
        ],
    ),
];

/// Domains with dedicated role templates
#[must_use]
pub fn known_domains() -> Vec<&'static str> {
    TEMPLATES.iter().map(|(domain, _)| *domain).collect()
}

/// Exactly `n` role labels for `domain`
///
/// Known domains (case-insensitive) are padded with numbered domain experts.
/// Other domains get three generic reviewer roles, padded with `Agent k`.
#[must_use]
pub fn domain_roles(domain: &str, n: usize) -> Vec<String> {
    let lowered = domain.trim().to_lowercase();
    let mut roles: Vec<String>;

    if let Some((_, template)) = TEMPLATES.iter().find(|(name, _)| *name == lowered) {
        roles = template.iter().take(n).map(|r| (*r).to_string()).collect();
        while roles.len() < n {
            roles.push(format!(
                "Domain Expert {} (provides additional {domain} perspective)",
                roles.len() + 1
            ));
        }
    } else {
        roles = [
            format!("Subject Matter Expert (deep knowledge in {domain})"),
            format!("Critical Reviewer (identifies weaknesses in {domain} solutions)"),
            format!("Practical Implementer (ensures {domain} feasibility)"),
        ]
        .into_iter()
        .take(n)
        .collect();
        while roles.len() < n {
            roles.push(format!("Agent {}", roles.len() + 1));
        }
    }
    roles
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn known_domain_is_case_insensitive() {
        let roles = domain_roles("Mathematics", 2);
        assert_eq!(roles.len(), 2);
        assert!(roles[0].starts_with("Theorem Prover"));
    }

    #[test]
    fn known_domain_pads_with_experts() {
        let roles = domain_roles("ethics", 5);
        assert_eq!(roles.len(), 5);
        assert_eq!(
            roles[4],
            "Domain Expert 5 (provides additional ethics perspective)"
        );
    }

    #[test]
    fn unknown_domain_uses_generic_roles() {
        let roles = domain_roles("cooking", 4);
        assert_eq!(
            roles,
            vec![
                "Subject Matter Expert (deep knowledge in cooking)".to_string(),
                "Critical Reviewer (identifies weaknesses in cooking solutions)".to_string(),
                "Practical Implementer (ensures cooking feasibility)".to_string(),
                "Agent 4".to_string(),
            ]
        );
        assert!(domain_roles("cooking", 0).is_empty());
    }

    #[test]
    fn every_known_domain_fills_three() {
        for domain in known_domains() {
            assert_eq!(domain_roles(domain, 3).len(), 3, "{domain}");
        }
    }
}
