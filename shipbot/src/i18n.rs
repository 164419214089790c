//! Minimal phrase lookup for user-facing chat text. The full localization
//! pipeline is an external concern; the bot only needs a fixed phrase table
//! per supported locale.

use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    Ru,
    En,
}

impl Default for Locale {
    fn default() -> Self {
        Locale::Ru
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ru" => Ok(Locale::Ru),
            "en" => Ok(Locale::En),
            other => Err(format!("Unsupported locale: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phrase {
    BotStarted,
    NewOrder,
    Items,
    DeliveryAddress,
    ShipmentDeadline,
    NoGift,
    LabelError,
    ReadyToShip,
    OrderOverdue,
    Status,
    OrderReady,
    BringToPickupPoint,
    StatusUpdateError,
    InternalError,
    DailyTasks,
    NoTasksToday,
    HandToCarrier,
    CarriageCreated,
    IncludesOrder,
    CarriageLabelError,
    CarriageError,
}

pub fn tr(locale: Locale, phrase: Phrase) -> &'static str {
    use Phrase::*;
    match locale {
        Locale::Ru => match phrase {
            BotStarted => "Бот запущен и следит за заказами",
            NewOrder => "Новый заказ",
            Items => "Товары:",
            DeliveryAddress => "Адрес доставки:",
            ShipmentDeadline => "Отгрузить до:",
            NoGift => "Подарок не полагается (сумма меньше порога)",
            LabelError => "Не удалось получить этикетку",
            ReadyToShip => "Готов к отгрузке",
            OrderOverdue => "Просрочена отгрузка заказа",
            Status => "Статус",
            OrderReady => "Заказ готов к отгрузке",
            BringToPickupPoint => "Принести в ПВЗ:",
            StatusUpdateError => "Ошибка при обновлении статуса",
            InternalError => "Внутренняя ошибка",
            DailyTasks => "Задачи на сегодня",
            NoTasksToday => "На сегодня задач по отгрузке нет",
            HandToCarrier => "Передать в службу доставки",
            CarriageCreated => "Сформирована отгрузка",
            IncludesOrder => "Включает заказ",
            CarriageLabelError => "Не удалось получить этикетку для отгрузки",
            CarriageError => "Ошибка при создании/подтверждении отгрузки",
        },
        Locale::En => match phrase {
            BotStarted => "The bot is up and watching for orders",
            NewOrder => "New order",
            Items => "Items:",
            DeliveryAddress => "Delivery address:",
            ShipmentDeadline => "Ship by:",
            NoGift => "No gift (total below the threshold)",
            LabelError => "Could not fetch the shipping label",
            ReadyToShip => "Ready to ship",
            OrderOverdue => "Shipment overdue for order",
            Status => "Status",
            OrderReady => "Order is ready to ship",
            BringToPickupPoint => "Bring to the pickup point:",
            StatusUpdateError => "Failed to update the order status",
            InternalError => "Internal error",
            DailyTasks => "Tasks for today",
            NoTasksToday => "No shipping tasks are pending today",
            HandToCarrier => "Hand over to the carrier",
            CarriageCreated => "Carriage created",
            IncludesOrder => "Includes order",
            CarriageLabelError => "Could not fetch the carriage label",
            CarriageError => "Could not create or approve the carriage",
        },
    }
}
