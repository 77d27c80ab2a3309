use sea_orm_migration::prelude::*;

use crate::m20240101_000001_create_tables::Currencies;

/// (name, area, symbol, ISO 4217 code)
const CURRENCIES: &[(&str, &str, &str, &str)] = &[
    ("US Dollar", "United States", "$", "USD"),
    ("Euro", "European Union", "€", "EUR"),
    ("Pound Sterling", "United Kingdom", "£", "GBP"),
    ("Swiss Franc", "Switzerland", "CHF", "CHF"),
    ("Czech Koruna", "Czech Republic", "Kč", "CZK"),
    ("Polish Zloty", "Poland", "zł", "PLN"),
    ("Ukrainian Hryvnia", "Ukraine", "₴", "UAH"),
    ("Japanese Yen", "Japan", "¥", "JPY"),
    ("Canadian Dollar", "Canada", "C$", "CAD"),
    ("Swedish Krona", "Sweden", "kr", "SEK"),
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert = Query::insert();
        insert.into_table(Currencies::Table).columns([
            Currencies::Name,
            Currencies::Area,
            Currencies::Symbol,
            Currencies::IsoCode,
        ]);

        for (name, area, symbol, iso_code) in CURRENCIES {
            insert.values_panic([
                (*name).into(),
                (*area).into(),
                (*symbol).into(),
                (*iso_code).into(),
            ]);
        }

        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let delete = Query::delete()
            .from_table(Currencies::Table)
            .and_where(
                Expr::col(Currencies::IsoCode)
                    .is_in(CURRENCIES.iter().map(|(_, _, _, iso_code)| *iso_code)),
            )
            .to_owned();

        manager.exec_stmt(delete).await
    }
}
