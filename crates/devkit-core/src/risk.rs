//! Heuristic risk scanner ("panic mode").
//!
//! Commands are matched as plain text against a static table of
//! case-insensitive regexes grouped by category. There is no shell parsing:
//! quoting, aliases and variables are not resolved.
//!
//! A record yields at most one match per category, namely the first pattern
//! of that category that matches.

use crate::types::HistoryRecord;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// Bump whenever [`BUILTIN_RULES`] changes.
pub const RULESET_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// RiskCategory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskCategory {
    ForcePush,
    HistoryRewrite,
    RecursiveDelete,
    DiskWipe,
    DatabaseDestructive,
    ContainerDestructive,
    OrchestrationDestructive,
    InfrastructureDestroy,
    Deploy,
    PackagePublish,
    SystemProcess,
}

impl RiskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::ForcePush => "force_push",
            RiskCategory::HistoryRewrite => "history_rewrite",
            RiskCategory::RecursiveDelete => "recursive_delete",
            RiskCategory::DiskWipe => "disk_wipe",
            RiskCategory::DatabaseDestructive => "database_destructive",
            RiskCategory::ContainerDestructive => "container_destructive",
            RiskCategory::OrchestrationDestructive => "orchestration_destructive",
            RiskCategory::InfrastructureDestroy => "infrastructure_destroy",
            RiskCategory::Deploy => "deploy",
            RiskCategory::PackagePublish => "package_publish",
            RiskCategory::SystemProcess => "system_process",
        }
    }

    /// Built-in manual rollback steps, shown when no AI backend is set up.
    pub fn rollback_hints(&self) -> &'static [&'static str] {
        match self {
            RiskCategory::ForcePush => &[
                "git reflog  # find the commit the remote pointed at before",
                "git push --force-with-lease origin <old-sha>:<branch>",
                "ask collaborators to check their local copies of the branch",
            ],
            RiskCategory::HistoryRewrite => &[
                "git reflog  # locate the lost commit",
                "git reset --hard <sha>  # or: git branch rescue <sha>",
                "git fsck --lost-found  # for dropped stashes",
            ],
            RiskCategory::RecursiveDelete => &[
                "stop writing to the affected filesystem",
                "restore from backup or snapshot",
                "for tracked files: git checkout -- <path>",
            ],
            RiskCategory::DiskWipe => &[
                "unmount the device immediately",
                "restore from backup; data recovery tools may help",
            ],
            RiskCategory::DatabaseDestructive => &[
                "check your migration tool's down/rollback command",
                "common: npm run migrate:down, rake db:rollback",
                "restore the latest database backup or point-in-time snapshot",
            ],
            RiskCategory::ContainerDestructive => &[
                "docker ps -a  # find remaining containers",
                "docker start <previous-container-id>",
                "re-pull images: docker compose pull && docker compose up -d",
            ],
            RiskCategory::OrchestrationDestructive => &[
                "kubectl rollout undo deployment/<name>",
                "kubectl rollout status deployment/<name>",
                "re-apply manifests from version control: kubectl apply -f <dir>",
            ],
            RiskCategory::InfrastructureDestroy => &[
                "terraform plan  # inspect what is missing",
                "terraform apply  # recreate from the last known-good config",
            ],
            RiskCategory::Deploy => &[
                "redeploy the previous release or image tag",
                "kubectl rollout undo deployment/<name>",
                "heroku releases:rollback / fly releases rollback",
            ],
            RiskCategory::PackagePublish => &[
                "npm unpublish <package>@<version>  # only within 72 hours",
                "cargo yank --version <version>",
                "publish a patched version",
            ],
            RiskCategory::SystemProcess => &[
                "systemctl start <service>",
                "check logs: journalctl -u <service> -n 100",
            ],
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

/// A category and its patterns, in match-priority order.
#[derive(Debug, Clone, Copy)]
pub struct RiskRule {
    pub category: RiskCategory,
    pub patterns: &'static [&'static str],
}

pub const BUILTIN_RULES: &[RiskRule] = &[
    RiskRule {
        category: RiskCategory::ForcePush,
        patterns: &[
            r"\bgit\s+push\b.*\s--force(-with-lease)?\b",
            r"\bgit\s+push\b.*\s-[a-z]*f[a-z]*(\s|$)",
            r"\bgit\s+push\b.*\s\+\S+",
        ],
    },
    RiskRule {
        category: RiskCategory::HistoryRewrite,
        patterns: &[
            r"\bgit\s+reset\b.*\s--hard\b",
            r"\bgit\s+clean\s+-[a-z]*f",
            r"\bgit\s+branch\s+(?-i:-D)\b",
            r"\bgit\s+push\b.*\s(--delete\b|:\S+)",
            r"\bgit\s+filter-(branch|repo)\b",
            r"\bgit\s+stash\s+(drop|clear)\b",
            r"\bgit\s+checkout\s+--\s+\.",
        ],
    },
    RiskRule {
        category: RiskCategory::RecursiveDelete,
        patterns: &[
            r"\brm\s+(\S+\s+)*-[a-z]*r[a-z]*\b",
            r"\brm\s+(\S+\s+)*--recursive\b",
            r"\bfind\b.*\s-delete\b",
            r"\brmdir\s+/s\b",
        ],
    },
    RiskRule {
        category: RiskCategory::DiskWipe,
        patterns: &[r"\bdd\b.*\bof=/dev/", r"\bmkfs(\.\w+)?\b", r"\bshred\b", r"\bwipefs\b"],
    },
    RiskRule {
        category: RiskCategory::DatabaseDestructive,
        patterns: &[
            r"\bdrop\s+(table|database|schema|index|view|collection)\b",
            r"\btruncate\s+table\b",
            r#"\bdelete\s+from\s+[\w."`]+\s*(;|"|'|$)"#,
            r"\bdropdb\b",
            r"\bflush(all|db)\b",
            r"\bdb\.(\w+\.drop|dropDatabase)\(",
            r"\bdb:(drop|reset|rollback)\b",
            r"\bmigrate:(fresh|reset|rollback)\b",
        ],
    },
    RiskRule {
        category: RiskCategory::ContainerDestructive,
        patterns: &[
            r"\b(docker|podman)\s+(system|volume|image|container|network|builder)\s+prune\b",
            r"\b(docker|podman)\s+(rm|rmi)\b.*\s(-f|--force)\b",
            r"\b(docker|podman)\s+volume\s+rm\b",
            r"\bdocker(-|\s+)compose\b.*\sdown\b.*\s(-v|--volumes)\b",
            r"\bpodman\s+system\s+reset\b",
        ],
    },
    RiskRule {
        category: RiskCategory::OrchestrationDestructive,
        patterns: &[
            r"\bkubectl\s+delete\b",
            r"\bkubectl\s+drain\b",
            r"\bkubectl\s+scale\b.*--replicas[=\s]0\b",
            r"\bkubectl\s+apply\b.*\s--prune\b",
            r"\bhelm\s+(uninstall|delete)\b",
        ],
    },
    RiskRule {
        category: RiskCategory::InfrastructureDestroy,
        patterns: &[
            r"\bterraform\s+destroy\b",
            r"\bterraform\s+apply\b.*-auto-approve\b",
            r"\bpulumi\s+destroy\b",
            r"\baws\s+s3\s+rb\b",
            r"\bgcloud\b.*\sdelete\b",
        ],
    },
    RiskRule {
        category: RiskCategory::Deploy,
        patterns: &[
            r"\bkubectl\s+(apply|set\s+image|rollout\s+restart)\b",
            r"\bhelm\s+(install|upgrade)\b",
            r"\b(fly|flyctl|gcloud\s+app|serverless|sls)\s+deploy\b",
            r"\bvercel\b.*\s--prod\b",
            r"\b(npm|yarn|pnpm)\s+run\s+deploy\b",
            r"\bmake\s+deploy\b",
            r"(^|\s)\./deploy\S*",
        ],
    },
    RiskRule {
        category: RiskCategory::PackagePublish,
        patterns: &[
            r"\b(npm|yarn|pnpm)\s+(publish|unpublish)\b",
            r"\bcargo\s+publish\b",
            r"\btwine\s+upload\b",
            r"\bgem\s+push\b",
            r"\bdocker\s+push\b",
        ],
    },
    RiskRule {
        category: RiskCategory::SystemProcess,
        patterns: &[
            r"\b(shutdown|reboot|poweroff|halt)\b",
            r"\bsystemctl\s+(stop|disable|mask)\b",
            r"\bkill\s+-(9|KILL)\b",
            r"\b(killall|pkill)\b",
        ],
    },
];

// ---------------------------------------------------------------------------
// Scan results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct RiskMatch<'a> {
    pub record: &'a HistoryRecord,
    pub category: RiskCategory,
    pub pattern: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RiskSummary {
    pub ruleset_version: u32,
    pub total: usize,
    /// Records with at least one match.
    pub dangerous: usize,
    pub by_category: BTreeMap<RiskCategory, usize>,
}

impl RiskSummary {
    pub fn dangerous_percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.dangerous as f64 * 100.0 / self.total as f64
        }
    }
}

// ---------------------------------------------------------------------------
// RiskScanner
// ---------------------------------------------------------------------------

struct CompiledRule {
    category: RiskCategory,
    patterns: Vec<(&'static str, Regex)>,
}

pub struct RiskScanner {
    rules: Vec<CompiledRule>,
}

static BUILTIN: OnceLock<RiskScanner> = OnceLock::new();

impl RiskScanner {
    /// Compile a rule table. Patterns are matched case-insensitively.
    pub fn new(rules: &[RiskRule]) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|rule| {
                let patterns = rule
                    .patterns
                    .iter()
                    .map(|p| Ok((*p, Regex::new(&format!("(?i){p}"))?)))
                    .collect::<Result<Vec<_>, regex::Error>>()?;
                Ok(CompiledRule {
                    category: rule.category,
                    patterns,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rules })
    }

    /// The scanner for [`BUILTIN_RULES`], compiled once.
    pub fn builtin() -> &'static RiskScanner {
        BUILTIN.get_or_init(|| {
            RiskScanner::new(BUILTIN_RULES).expect("built-in risk patterns must compile")
        })
    }

    /// `(category, pattern)` for each category that matches `command`.
    pub fn classify(&self, command: &str) -> Vec<(RiskCategory, &'static str)> {
        self.rules
            .iter()
            .filter_map(|rule| {
                rule.patterns
                    .iter()
                    .find(|(_, re)| re.is_match(command))
                    .map(|(src, _)| (rule.category, *src))
            })
            .collect()
    }

    pub fn is_dangerous(&self, command: &str) -> bool {
        self.rules
            .iter()
            .any(|rule| rule.patterns.iter().any(|(_, re)| re.is_match(command)))
    }

    pub fn scan<'a>(&self, records: &'a [HistoryRecord]) -> Vec<RiskMatch<'a>> {
        records
            .iter()
            .flat_map(|record| {
                self.classify(&record.command)
                    .into_iter()
                    .map(move |(category, pattern)| RiskMatch {
                        record,
                        category,
                        pattern,
                    })
            })
            .collect()
    }

    /// Scan only the last `window` records.
    pub fn recent<'a>(&self, records: &'a [HistoryRecord], window: usize) -> Vec<RiskMatch<'a>> {
        let start = records.len().saturating_sub(window);
        self.scan(&records[start..])
    }

    pub fn stats(&self, records: &[HistoryRecord]) -> BTreeMap<RiskCategory, usize> {
        let mut counts = BTreeMap::new();
        for m in self.scan(records) {
            *counts.entry(m.category).or_insert(0) += 1;
        }
        counts
    }

    pub fn summary(&self, records: &[HistoryRecord]) -> RiskSummary {
        RiskSummary {
            ruleset_version: RULESET_VERSION,
            total: records.len(),
            dangerous: records
                .iter()
                .filter(|r| self.is_dangerous(&r.command))
                .count(),
            by_category: self.stats(records),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
