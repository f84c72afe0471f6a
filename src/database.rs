use std::str::FromStr;

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::info;

use crate::bazi::FiveElement;
use crate::models::CrystalRecord;
use crate::models::CrystalRow;
use crate::models::Payment;
use crate::models::PredictionRow;
use crate::models::User;
use crate::CrystalPathError;
use crate::Result;

/// Database connection pool wrapper
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

/// Prediction insert payload; analysis columns are pre-serialized JSON.
#[derive(Debug, Clone)]
pub struct NewPrediction {
    pub user_id: i64,
    pub birth_date: String,
    pub birth_time: String,
    pub birth_location: String,
    pub chart: String,
    pub fortune: String,
    pub recommendations: String,
    pub narrative: String,
}

impl Database {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new database instance from configuration
    pub async fn from_config(config: &crate::config::AppConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(config.database_url())?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections())
            .acquire_timeout(std::time::Duration::from_secs(config.connection_timeout()))
            .connect_with(options)
            .await?;

        Ok(Self::new(pool))
    }

    /// Connect to an in-memory database (tests). A single pinned connection
    /// keeps the database alive for the pool's lifetime.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self::new(pool))
    }

    /// Get a reference to the pool for raw queries
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize database schema
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                full_name TEXT,
                prediction_credits INTEGER NOT NULL DEFAULT 1,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS predictions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                birth_date TEXT NOT NULL,
                birth_time TEXT NOT NULL,
                birth_location TEXT NOT NULL,
                chart TEXT NOT NULL,
                fortune TEXT NOT NULL,
                recommendations TEXT NOT NULL,
                narrative TEXT NOT NULL,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users (id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS payments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                amount REAL NOT NULL,
                currency TEXT NOT NULL DEFAULT 'CNY',
                status TEXT NOT NULL DEFAULT 'pending',
                payment_method TEXT NOT NULL DEFAULT 'alipay',
                transaction_id TEXT,
                credits_added INTEGER NOT NULL DEFAULT 2,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (user_id) REFERENCES users (id)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS crystals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                english_name TEXT NOT NULL,
                chinese_name TEXT NOT NULL,
                category TEXT,
                color TEXT,
                elements TEXT NOT NULL DEFAULT '[]',
                healing_properties TEXT NOT NULL DEFAULT '[]',
                suitable_for TEXT NOT NULL DEFAULT '[]',
                image_url TEXT,
                price REAL,
                description TEXT,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Create a user. New accounts start with one free prediction credit.
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        full_name: Option<&str>,
    ) -> Result<User> {
        let result = sqlx::query(
            "INSERT INTO users (email, password_hash, full_name) VALUES (?, ?, ?)",
        )
        .bind(email)
        .bind(password_hash)
        .bind(full_name)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_user_by_id(id)
            .await?
            .ok_or(CrystalPathError::UserNotFound(id))
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Add prediction credits (payment success path)
    pub async fn add_credits(&self, user_id: i64, count: i64) -> Result<()> {
        sqlx::query(
            "UPDATE users SET prediction_credits = prediction_credits + ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(count)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Predictions
    // ------------------------------------------------------------------

    /// Insert a prediction row and consume one credit in a single
    /// transaction. The decrement is conditioned on `prediction_credits > 0`
    /// at the storage layer; zero rows affected rolls the insert back, so
    /// concurrent requests can never drive the counter negative or record a
    /// prediction without a matching debit.
    pub async fn create_prediction_consuming_credit(
        &self,
        prediction: &NewPrediction,
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            INSERT INTO predictions
                (user_id, birth_date, birth_time, birth_location, chart, fortune, recommendations, narrative)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(prediction.user_id)
        .bind(&prediction.birth_date)
        .bind(&prediction.birth_time)
        .bind(&prediction.birth_location)
        .bind(&prediction.chart)
        .bind(&prediction.fortune)
        .bind(&prediction.recommendations)
        .bind(&prediction.narrative)
        .execute(&mut *tx)
        .await?;

        let prediction_id = result.last_insert_rowid();

        let debit = sqlx::query(
            "UPDATE users SET prediction_credits = prediction_credits - 1, updated_at = CURRENT_TIMESTAMP WHERE id = ? AND prediction_credits > 0",
        )
        .bind(prediction.user_id)
        .execute(&mut *tx)
        .await?;

        if debit.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(CrystalPathError::InsufficientCredits);
        }

        tx.commit().await?;
        Ok(prediction_id)
    }

    pub async fn list_predictions(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PredictionRow>> {
        let rows = sqlx::query_as::<_, PredictionRow>(
            "SELECT * FROM predictions WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_prediction(&self, id: i64, user_id: i64) -> Result<Option<PredictionRow>> {
        let row = sqlx::query_as::<_, PredictionRow>(
            "SELECT * FROM predictions WHERE id = ? AND user_id = ?",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    // ------------------------------------------------------------------
    // Payments
    // ------------------------------------------------------------------

    pub async fn create_payment(
        &self,
        user_id: i64,
        amount: f64,
        currency: &str,
        credits_added: i64,
    ) -> Result<Payment> {
        let result = sqlx::query(
            "INSERT INTO payments (user_id, amount, currency, credits_added) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(amount)
        .bind(currency)
        .bind(credits_added)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(payment)
    }

    pub async fn get_payment(&self, id: i64) -> Result<Option<Payment>> {
        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(payment)
    }

    pub async fn list_payments(
        &self,
        user_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Payment>> {
        let rows = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn mark_payment_failed(&self, id: i64, transaction_id: Option<&str>) -> Result<()> {
        sqlx::query(
            "UPDATE payments SET status = 'failed', transaction_id = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(transaction_id)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Mark a payment successful and credit the user, idempotently: a
    /// payment already in `success` state is not credited a second time.
    /// Returns whether the credit was applied.
    pub async fn complete_payment(&self, id: i64, transaction_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(payment) = payment else {
            tx.rollback().await?;
            return Err(CrystalPathError::Payment(format!(
                "payment {id} does not exist"
            )));
        };

        let updated = sqlx::query(
            "UPDATE payments SET status = 'success', transaction_id = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ? AND status != 'success'",
        )
        .bind(transaction_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            "UPDATE users SET prediction_credits = prediction_credits + ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(payment.credits_added)
        .bind(payment.user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Crystals
    // ------------------------------------------------------------------

    pub async fn list_crystals(&self) -> Result<Vec<CrystalRecord>> {
        let rows =
            sqlx::query_as::<_, CrystalRow>("SELECT * FROM crystals ORDER BY english_name")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter()
            .map(|r| CrystalRecord::try_from(r).map_err(CrystalPathError::from))
            .collect()
    }

    pub async fn get_crystal(&self, id: i64) -> Result<Option<CrystalRecord>> {
        let row = sqlx::query_as::<_, CrystalRow>("SELECT * FROM crystals WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| CrystalRecord::try_from(r).map_err(CrystalPathError::from))
            .transpose()
    }

    pub async fn crystals_by_element(&self, element: FiveElement) -> Result<Vec<CrystalRecord>> {
        let pattern = format!("%\"{}\"%", element.chinese());
        let rows = sqlx::query_as::<_, CrystalRow>("SELECT * FROM crystals WHERE elements LIKE ?")
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|r| CrystalRecord::try_from(r).map_err(CrystalPathError::from))
            .collect()
    }

    pub async fn crystals_by_healing_property(&self, property: &str) -> Result<Vec<CrystalRecord>> {
        let pattern = format!("%{property}%");
        let rows = sqlx::query_as::<_, CrystalRow>(
            "SELECT * FROM crystals WHERE healing_properties LIKE ?",
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|r| CrystalRecord::try_from(r).map_err(CrystalPathError::from))
            .collect()
    }

    pub async fn search_crystals(&self, keyword: &str) -> Result<Vec<CrystalRecord>> {
        let pattern = format!("%{keyword}%");
        let rows = sqlx::query_as::<_, CrystalRow>(
            "SELECT * FROM crystals WHERE english_name LIKE ? OR chinese_name LIKE ? OR description LIKE ?",
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|r| CrystalRecord::try_from(r).map_err(CrystalPathError::from))
            .collect()
    }

    /// Reset and seed the crystal catalog with the reference data set.
    pub async fn seed_crystals(&self) -> Result<usize> {
        sqlx::query("DELETE FROM crystals")
            .execute(&self.pool)
            .await?;

        let seed: &[(&str, &str, &str, &str, &str, &str, &str, &str, f64, &str)] = &[
            (
                "Amethyst",
                "紫水晶",
                "石英类",
                "紫色",
                r#"["水"]"#,
                r#"["净化意念","增强直觉","平静心灵","改善睡眠"]"#,
                r#"["健康运","感情运","灵性提升"]"#,
                "/images/amethyst.jpg",
                88.0,
                "紫水晶被誉为智慧之石，能够净化心灵，增强直觉力，帮助保持内心平静。",
            ),
            (
                "Rose Quartz",
                "粉水晶",
                "石英类",
                "粉色",
                r#"["土"]"#,
                r#"["增进爱情","治愈心灵创伤","提升自信","缓解情绪压力"]"#,
                r#"["感情运","人际关系","心理健康"]"#,
                "/images/rose_quartz.jpg",
                66.0,
                "粉水晶被称为爱情之石，能够吸引爱情，治愈心灵创伤，增强人际关系。",
            ),
            (
                "Clear Quartz",
                "白水晶",
                "石英类",
                "白色",
                r#"["金"]"#,
                r#"["放大能量","净化磁场","增强专注力","促进治愈"]"#,
                r#"["事业运","健康运","能量增强"]"#,
                "/images/clear_quartz.jpg",
                55.0,
                "白水晶被誉为水晶之王，具有放大和净化能量的作用，可以增强其他水晶的能量。",
            ),
            (
                "Citrine",
                "黄水晶",
                "石英类",
                "黄色",
                r#"["土"]"#,
                r#"["招财进宝","增强自信","提升创造力","带来欢乐"]"#,
                r#"["财运","事业运","创业发展"]"#,
                "/images/citrine.jpg",
                99.0,
                "黄水晶被称为商人之石，具有强大的招财能量，能够吸引财富和成功。",
            ),
            (
                "Green Aventurine",
                "绿东陵石",
                "石英类",
                "绿色",
                r#"["木"]"#,
                r#"["平衡情绪","增强领导力","吸引好运","促进成长"]"#,
                r#"["事业运","健康运","人际关系"]"#,
                "/images/green_aventurine.jpg",
                77.0,
                "绿东陵石被誉为机会之石，能够带来好运和机会，特别适合创业者和投资者。",
            ),
            (
                "Black Tourmaline",
                "黑电气石",
                "电气石类",
                "黑色",
                r#"["水"]"#,
                r#"["防护负能量","增强安全感","稳定情绪","净化磁场"]"#,
                r#"["健康运","工作压力","环境净化"]"#,
                "/images/black_tourmaline.jpg",
                88.0,
                "黑电气石被誉为防护之石，能够有效阻挡负能量，保护佩带者的能量场。",
            ),
            (
                "Moonstone",
                "月光石",
                "长石类",
                "白色",
                r#"["水"]"#,
                r#"["增强直觉","平衡荷尔蒙","提升女性魅力","促进灵性成长"]"#,
                r#"["感情运","女性健康","灵性发展"]"#,
                "/images/moonstone.jpg",
                108.0,
                "月光石被称为女性之石，能够平衡荷尔蒙，增强直觉力和灵性敏感度。",
            ),
            (
                "Tiger Eye",
                "虎眼石",
                "石英类",
                "黄棕色",
                r#"["土"]"#,
                r#"["增强勇气","提升专注力","吸引财富","平衡能量"]"#,
                r#"["事业运","财运","领导力提升"]"#,
                "/images/tiger_eye.jpg",
                66.0,
                "虎眼石被誉为勇气之石，能够增强意志力和决断力，帮助佩带者克服困难。",
            ),
        ];

        for row in seed {
            sqlx::query(
                r"
                INSERT INTO crystals
                    (english_name, chinese_name, category, color, elements, healing_properties, suitable_for, image_url, price, description)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )
            .bind(row.0)
            .bind(row.1)
            .bind(row.2)
            .bind(row.3)
            .bind(row.4)
            .bind(row.5)
            .bind(row.6)
            .bind(row.7)
            .bind(row.8)
            .bind(row.9)
            .execute(&self.pool)
            .await?;
        }

        info!("Seeded {} crystals", seed.len());
        Ok(seed.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        let db = Database::in_memory().await.unwrap();
        db.init_schema().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_create_and_fetch_user() {
        let db = test_db().await;
        let user = db
            .create_user("alice@example.com", "hash", Some("Alice"))
            .await
            .unwrap();
        assert_eq!(user.prediction_credits, 1);

        let by_email = db.get_user_by_email("alice@example.com").await.unwrap();
        assert_eq!(by_email.unwrap().id, user.id);

        assert!(db.get_user_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let db = test_db().await;
        db.create_user("a@example.com", "h", None).await.unwrap();
        assert!(db.create_user("a@example.com", "h", None).await.is_err());
    }

    fn sample_prediction(user_id: i64) -> NewPrediction {
        NewPrediction {
            user_id,
            birth_date: "1990-06-15".to_string(),
            birth_time: "14:30".to_string(),
            birth_location: "北京".to_string(),
            chart: "{}".to_string(),
            fortune: "{}".to_string(),
            recommendations: "{}".to_string(),
            narrative: "{}".to_string(),
        }
    }

    #[tokio::test]
    async fn test_prediction_consumes_exactly_one_credit() {
        let db = test_db().await;
        let user = db.create_user("b@example.com", "h", None).await.unwrap();

        db.create_prediction_consuming_credit(&sample_prediction(user.id))
            .await
            .unwrap();

        let user = db.get_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.prediction_credits, 0);
    }

    #[tokio::test]
    async fn test_prediction_rejected_without_credits_and_rolls_back() {
        let db = test_db().await;
        let user = db.create_user("c@example.com", "h", None).await.unwrap();

        db.create_prediction_consuming_credit(&sample_prediction(user.id))
            .await
            .unwrap();
        let err = db
            .create_prediction_consuming_credit(&sample_prediction(user.id))
            .await
            .unwrap_err();
        assert!(matches!(err, CrystalPathError::InsufficientCredits));

        // credit never goes negative and the second insert was rolled back
        let user_after = db.get_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user_after.prediction_credits, 0);
        let rows = db.list_predictions(user.id, 10, 0).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_prediction_owner_scoping() {
        let db = test_db().await;
        let alice = db.create_user("d@example.com", "h", None).await.unwrap();
        let bob = db.create_user("e@example.com", "h", None).await.unwrap();

        let id = db
            .create_prediction_consuming_credit(&sample_prediction(alice.id))
            .await
            .unwrap();

        assert!(db.get_prediction(id, alice.id).await.unwrap().is_some());
        assert!(db.get_prediction(id, bob.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_payment_completion_is_idempotent() {
        let db = test_db().await;
        let user = db.create_user("f@example.com", "h", None).await.unwrap();

        let payment = db.create_payment(user.id, 5.0, "CNY", 2).await.unwrap();
        assert_eq!(payment.status, "pending");

        assert!(db.complete_payment(payment.id, "tx-1").await.unwrap());
        // replayed webhook must not credit twice
        assert!(!db.complete_payment(payment.id, "tx-1").await.unwrap());

        let user = db.get_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.prediction_credits, 1 + 2);
    }

    #[tokio::test]
    async fn test_crystal_seed_and_queries() {
        let db = test_db().await;
        let count = db.seed_crystals().await.unwrap();
        assert_eq!(count, 8);

        let all = db.list_crystals().await.unwrap();
        assert_eq!(all.len(), 8);

        let water = db.crystals_by_element(FiveElement::Water).await.unwrap();
        assert!(water.iter().any(|c| c.english_name == "Amethyst"));
        assert!(water.iter().all(|c| c.elements.contains(&FiveElement::Water)));

        let found = db.search_crystals("紫水晶").await.unwrap();
        assert_eq!(found.len(), 1);

        let by_healing = db.crystals_by_healing_property("招财").await.unwrap();
        assert!(by_healing.iter().any(|c| c.english_name == "Citrine"));

        // seeding twice does not duplicate the catalog
        db.seed_crystals().await.unwrap();
        assert_eq!(db.list_crystals().await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_malformed_catalog_blob_surfaces_error() {
        let db = test_db().await;
        sqlx::query(
            "INSERT INTO crystals (english_name, chinese_name, elements, healing_properties, suitable_for) VALUES ('Bad', '坏', 'not-json', '[]', '[]')",
        )
        .execute(db.pool())
        .await
        .unwrap();

        assert!(db.list_crystals().await.is_err());
    }
}
