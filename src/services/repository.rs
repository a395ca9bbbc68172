use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::models::class::{AnswerFileInfo, ClassInfoResponse, ClassSummary, GuideInfo, QuizInfo};

/// Directories under the project root that are never presented as classes.
const RESERVED_DIRS: &[&str] = &["Server", "prompts", "Example_Class"];

#[derive(Debug, thiserror::Error)]
#[error("path segment {0:?} is not allowed")]
pub struct PathError(String);

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("not found")]
    NotFound,

    #[error(transparent)]
    InvalidPath(#[from] PathError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Read-side collaborator over the on-disk class tree:
///
/// ```text
/// {project_root}/{class}/Quiz/*.html
/// {project_root}/{class}/Guide/*
/// {project_root}/{class}/Answers/*.txt
/// {project_root}/{class}/Archive/*_results.html
/// ```
pub struct ClassRepository {
    project_root: PathBuf,
}

impl ClassRepository {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// List class directories, excluding hidden and reserved names.
    pub async fn list_classes(&self) -> Result<Vec<ClassSummary>, RepoError> {
        let mut entries = tokio::fs::read_dir(&self.project_root).await?;
        let mut classes = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') || RESERVED_DIRS.contains(&name.as_str()) {
                continue;
            }
            classes.push(ClassSummary {
                path: format!("/class/{name}"),
                name,
            });
        }
        classes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(classes)
    }

    /// Quizzes, guides, and saved answers for one class. Missing
    /// subdirectories yield empty lists; a missing class is NotFound.
    pub async fn class_info(&self, class_name: &str) -> Result<ClassInfoResponse, RepoError> {
        let class_dir = self.class_dir(class_name).await?;

        let mut quizzes = Vec::new();
        for filename in list_files(&class_dir.join("Quiz")).await {
            if !filename.ends_with(".html") {
                continue;
            }
            let stem = filename.trim_end_matches(".html");
            quizzes.push(QuizInfo {
                name: stem.replace('_', " "),
                url: format!("/quiz/{class_name}/{filename}"),
                filename,
            });
        }
        quizzes.sort_by(|a, b| a.filename.cmp(&b.filename));

        let mut guides = Vec::new();
        for filename in list_files(&class_dir.join("Guide")).await {
            guides.push(GuideInfo {
                name: filename.clone(),
                url: format!("/guide/{class_name}/{filename}"),
                filename,
            });
        }
        guides.sort_by(|a, b| a.filename.cmp(&b.filename));

        let mut saved_answers = Vec::new();
        let answers_dir = class_dir.join("Answers");
        for filename in list_files(&answers_dir).await {
            if !filename.ends_with(".txt") {
                continue;
            }
            let metadata = match tokio::fs::metadata(answers_dir.join(&filename)).await {
                Ok(metadata) => metadata,
                Err(e) => {
                    tracing::debug!(file = %filename, error = %e, "skipping unreadable answer file");
                    continue;
                }
            };
            let date = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            saved_answers.push(AnswerFileInfo {
                name: filename.clone(),
                url: format!("/api/answers/{class_name}/{filename}"),
                filename,
                date,
                size: metadata.len(),
            });
        }
        // Most recent first.
        saved_answers.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(ClassInfoResponse {
            class_name: class_name.to_string(),
            quizzes,
            guides,
            saved_answers,
        })
    }

    /// The class's `Answers` directory; path-checked but not required to
    /// exist yet (submissions create it).
    pub fn answers_dir(&self, class_name: &str) -> Result<PathBuf, PathError> {
        validate_segment(class_name)?;
        Ok(self.project_root.join(class_name).join("Answers"))
    }

    /// Read a saved answer file back verbatim.
    pub async fn read_answer(&self, class_name: &str, filename: &str) -> Result<String, RepoError> {
        validate_segment(class_name)?;
        validate_segment(filename)?;
        let path = self.project_root.join(class_name).join("Answers").join(filename);
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|_| RepoError::NotFound)
    }

    pub async fn quiz_path(&self, class_name: &str, filename: &str) -> Result<PathBuf, RepoError> {
        self.artifact_path(class_name, "Quiz", filename).await
    }

    pub async fn guide_path(&self, class_name: &str, filename: &str) -> Result<PathBuf, RepoError> {
        self.artifact_path(class_name, "Guide", filename).await
    }

    pub async fn results_path(&self, class_name: &str, filename: &str) -> Result<PathBuf, RepoError> {
        self.artifact_path(class_name, "Archive", filename).await
    }

    async fn class_dir(&self, class_name: &str) -> Result<PathBuf, RepoError> {
        validate_segment(class_name)?;
        let dir = self.project_root.join(class_name);
        match tokio::fs::metadata(&dir).await {
            Ok(metadata) if metadata.is_dir() => Ok(dir),
            _ => Err(RepoError::NotFound),
        }
    }

    async fn artifact_path(
        &self,
        class_name: &str,
        area: &str,
        filename: &str,
    ) -> Result<PathBuf, RepoError> {
        validate_segment(class_name)?;
        validate_segment(filename)?;
        let path = self.project_root.join(class_name).join(area).join(filename);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            Ok(path)
        } else {
            Err(RepoError::NotFound)
        }
    }
}

/// Non-hidden file names in a directory; a missing directory is an empty
/// list.
async fn list_files(dir: &Path) -> Vec<String> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };
    let mut files = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        if !entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        files.push(name);
    }
    files
}

/// A client-supplied path segment must be exactly one normal component and
/// must not be hidden: no separators, no `..`, no absolute paths.
fn validate_segment(segment: &str) -> Result<(), PathError> {
    let mut components = Path::new(segment).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single_normal || segment.starts_with('.') {
        return Err(PathError(segment.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tree() -> (TempDir, ClassRepository) {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("Biology/Quiz")).unwrap();
        std::fs::create_dir_all(root.join("Biology/Guide")).unwrap();
        std::fs::create_dir_all(root.join("Biology/Answers")).unwrap();
        std::fs::create_dir_all(root.join("Math")).unwrap();
        std::fs::create_dir_all(root.join("Server")).unwrap();
        std::fs::create_dir_all(root.join("prompts")).unwrap();
        std::fs::create_dir_all(root.join("Example_Class")).unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::write(root.join("Biology/Quiz/Cell_Division.html"), "<html></html>").unwrap();
        std::fs::write(root.join("Biology/Quiz/notes.txt"), "not a quiz").unwrap();
        std::fs::write(root.join("Biology/Guide/mitosis.pdf"), "pdf").unwrap();
        std::fs::write(root.join("Biology/Answers/Quiz_Ada_1.txt"), "answers").unwrap();
        std::fs::write(root.join("Biology/Answers/.hidden.txt"), "x").unwrap();
        let repo = ClassRepository::new(root);
        (dir, repo)
    }

    #[tokio::test]
    async fn lists_classes_excluding_reserved_and_hidden() {
        let (_dir, repo) = tree();
        let classes = repo.list_classes().await.unwrap();
        let names: Vec<&str> = classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Biology", "Math"]);
        assert_eq!(classes[0].path, "/class/Biology");
    }

    #[tokio::test]
    async fn class_info_catalogs_quizzes_guides_and_answers() {
        let (_dir, repo) = tree();
        let info = repo.class_info("Biology").await.unwrap();

        assert_eq!(info.quizzes.len(), 1);
        assert_eq!(info.quizzes[0].name, "Cell Division");
        assert_eq!(info.quizzes[0].url, "/quiz/Biology/Cell_Division.html");

        assert_eq!(info.guides.len(), 1);
        assert_eq!(info.guides[0].filename, "mitosis.pdf");

        assert_eq!(info.saved_answers.len(), 1);
        assert_eq!(info.saved_answers[0].url, "/api/answers/Biology/Quiz_Ada_1.txt");
        assert_eq!(info.saved_answers[0].size, 7);
    }

    #[tokio::test]
    async fn class_info_with_no_subdirs_is_empty_not_an_error() {
        let (_dir, repo) = tree();
        let info = repo.class_info("Math").await.unwrap();
        assert!(info.quizzes.is_empty());
        assert!(info.guides.is_empty());
        assert!(info.saved_answers.is_empty());
    }

    #[tokio::test]
    async fn unknown_class_is_not_found() {
        let (_dir, repo) = tree();
        assert!(matches!(
            repo.class_info("Chemistry").await,
            Err(RepoError::NotFound)
        ));
    }

    #[tokio::test]
    async fn answer_round_trip_is_byte_identical() {
        let (_dir, repo) = tree();
        let content = repo.read_answer("Biology", "Quiz_Ada_1.txt").await.unwrap();
        assert_eq!(content, "answers");
    }

    #[tokio::test]
    async fn traversal_segments_are_rejected() {
        let (_dir, repo) = tree();
        for bad in ["..", "../Biology", "a/b", "/etc", ".hidden", ""] {
            assert!(
                matches!(repo.class_info(bad).await, Err(RepoError::InvalidPath(_))),
                "expected {bad:?} to be rejected"
            );
        }
        assert!(repo.read_answer("Biology", "../../etc/passwd").await.is_err());
    }

    #[test]
    fn validate_segment_accepts_normal_names() {
        assert!(validate_segment("Biology").is_ok());
        assert!(validate_segment("Quiz_1_Ada_2026.txt").is_ok());
    }
}
